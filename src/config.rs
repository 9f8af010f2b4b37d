//! Carousel options.
//!
//! Every field has a default, so a TOML file only needs the keys it changes:
//!
//! ```toml
//! auto_play = false
//! infinite = false
//! preload_count = 1
//! ```

use crate::constants::*;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// How the view moves from one slide to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionEffect {
    #[default]
    Slide,
    Fade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CarouselConfig {
    pub auto_play: bool,
    pub interval_ms: u64,
    pub infinite: bool,
    pub preload_count: usize,
    /// When false every slide is requested at mount.
    pub lazy_load: bool,
    pub touch_enabled: bool,
    pub keyboard_enabled: bool,
    pub transition_ms: u64,
    pub swipe_threshold_px: f32,
    pub show_indicators: bool,
    pub show_controls: bool,
    pub effect: TransitionEffect,
}

impl Default for CarouselConfig {
    fn default() -> Self {
        Self {
            auto_play: true,
            interval_ms: AUTOPLAY_INTERVAL_MS,
            infinite: true,
            preload_count: PRELOAD_COUNT,
            lazy_load: true,
            touch_enabled: true,
            keyboard_enabled: true,
            transition_ms: TRANSITION_MS,
            swipe_threshold_px: SWIPE_THRESHOLD_PX,
            show_indicators: true,
            show_controls: true,
            effect: TransitionEffect::Slide,
        }
    }
}

impl CarouselConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CarouselConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_ms == 0 {
            return Err(ConfigError::Invalid("interval_ms must be positive".into()));
        }
        if self.transition_ms == 0 {
            return Err(ConfigError::Invalid("transition_ms must be positive".into()));
        }
        if !(self.swipe_threshold_px > 0.0) {
            return Err(ConfigError::Invalid(
                "swipe_threshold_px must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn transition(&self) -> Duration {
        Duration::from_millis(self.transition_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_match_constants() {
        let c = CarouselConfig::default();
        assert!(c.auto_play);
        assert!(c.infinite);
        assert_eq!(c.interval_ms, 5000);
        assert_eq!(c.transition_ms, 500);
        assert_eq!(c.preload_count, 2);
        assert!(c.lazy_load);
        assert_eq!(c.swipe_threshold_px, 50.0);
        assert_eq!(c.effect, TransitionEffect::Slide);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let c = CarouselConfig::from_toml_str("infinite = false\neffect = \"fade\"").unwrap();
        assert!(!c.infinite);
        assert_eq!(c.effect, TransitionEffect::Fade);
        assert_eq!(c.interval_ms, AUTOPLAY_INTERVAL_MS);
        assert!(c.touch_enabled);
    }

    #[test]
    fn unknown_key_is_rejected() {
        let err = CarouselConfig::from_toml_str("autoplay = true").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn zero_interval_is_invalid() {
        let err = CarouselConfig::from_toml_str("interval_ms = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn zero_transition_is_invalid() {
        let c = CarouselConfig {
            transition_ms: 0,
            ..CarouselConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn negative_swipe_threshold_is_invalid() {
        let c = CarouselConfig {
            swipe_threshold_px: -5.0,
            ..CarouselConfig::default()
        };
        assert!(c.validate().is_err());
    }

    #[test]
    fn load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "interval_ms = 1500\npreload_count = 0").unwrap();
        let c = CarouselConfig::load(file.path()).unwrap();
        assert_eq!(c.interval(), Duration::from_millis(1500));
        assert_eq!(c.preload_count, 0);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let err = CarouselConfig::load(Path::new("/nonexistent/carousel.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
