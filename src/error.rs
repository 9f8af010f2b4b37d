//! Error types shared across the crate.
//!
//! Only [`CarouselError`] ever reaches a caller of the engine, and only from
//! [`Carousel::mount`](crate::engine::Carousel::mount). Everything else is
//! recovered inside the engine and reported through the logging sink.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Fatal construction errors.
#[derive(Error, Debug)]
pub enum CarouselError {
    #[error("mount point `{0}` not found")]
    MountPointNotFound(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Invalid(String),
}

/// Why a navigation command was dropped. Logged, never returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationRejected {
    #[error("index {index} out of range (slide count {len})")]
    OutOfRange { index: usize, len: usize },
    #[error("transition in progress")]
    Animating,
    #[error("already at the {0} boundary")]
    AtBoundary(&'static str),
    #[error("carousel has no slides")]
    Empty,
    #[error("carousel destroyed")]
    Destroyed,
}

#[derive(Error, Debug)]
pub enum AssetLoadError {
    #[error("asset not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("IO error reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("unsupported image format: {0}")]
    Unsupported(String),
    #[error("cannot decode image: {0}")]
    Decode(String),
    #[error("gave up after {attempts} attempts: {source}")]
    Exhausted {
        attempts: u32,
        #[source]
        source: Box<AssetLoadError>,
    },
}

impl AssetLoadError {
    /// Whether another attempt could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AssetLoadError::Io { .. })
    }
}

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("no image files found in {}", .0.display())]
    Empty(PathBuf),
    #[error("manifest parse error: {0}")]
    Manifest(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_io_errors_are_transient() {
        let io = AssetLoadError::Io {
            path: PathBuf::from("a.jpg"),
            source: io::Error::new(io::ErrorKind::Interrupted, "busy"),
        };
        assert!(io.is_transient());
        assert!(!AssetLoadError::NotFound(PathBuf::from("a.jpg")).is_transient());
        assert!(!AssetLoadError::Unsupported("tiff".into()).is_transient());
    }

    #[test]
    fn exhausted_display_includes_cause() {
        let err = AssetLoadError::Exhausted {
            attempts: 3,
            source: Box::new(AssetLoadError::Unsupported("tiff".into())),
        };
        assert_eq!(
            err.to_string(),
            "gave up after 3 attempts: unsupported image format: tiff"
        );
    }

    #[test]
    fn config_error_converts_into_carousel_error() {
        let err: CarouselError = ConfigError::Invalid("interval_ms must be positive".into()).into();
        assert!(matches!(err, CarouselError::Config(_)));
        assert_eq!(
            err.to_string(),
            "Config validation error: interval_ms must be positive"
        );
    }
}
