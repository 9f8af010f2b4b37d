use crate::error::AssetLoadError;
use crate::retry::{with_retry, RetryPolicy};
use exif::{In, Reader, Tag, Value};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "gif"];

/// Full-resolution image data for one slide.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub bytes: Vec<u8>,
    /// Lowercase file extension, used as a decoder hint.
    pub extension: String,
    /// EXIF orientation (1 when absent).
    pub orientation: u16,
}

#[derive(Debug)]
pub struct LoadCompletion {
    pub index: usize,
    pub result: Result<Asset, AssetLoadError>,
}

/// A fire-and-forget load. The loader answers on `reply`; if the receiving
/// side is gone the answer is dropped.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    pub index: usize,
    pub url: String,
    pub reply: Sender<LoadCompletion>,
}

impl LoadRequest {
    pub fn complete(&self, result: Result<Asset, AssetLoadError>) {
        let _ = self.reply.send(LoadCompletion {
            index: self.index,
            result,
        });
    }
}

pub trait AssetLoader {
    fn load(&mut self, request: LoadRequest);
}

/// Loads slide files from a root directory on a worker thread.
pub struct FileLoader {
    jobs: Option<Sender<LoadRequest>>,
    worker: Option<JoinHandle<()>>,
}

impl FileLoader {
    pub fn spawn(root: impl Into<PathBuf>, policy: RetryPolicy) -> std::io::Result<Self> {
        let root = root.into();
        let (jobs, queue) = mpsc::channel::<LoadRequest>();
        let worker = thread::Builder::new()
            .name("asset-loader".into())
            .spawn(move || {
                for request in queue {
                    let result = fetch_asset(&root, &request.url, &policy);
                    if let Err(e) = &result {
                        log::warn!("Failed to load {}: {}", request.url, e);
                    }
                    request.complete(result);
                }
            })?;
        Ok(Self {
            jobs: Some(jobs),
            worker: Some(worker),
        })
    }
}

impl AssetLoader for FileLoader {
    fn load(&mut self, request: LoadRequest) {
        let Some(jobs) = &self.jobs else { return };
        if let Err(mpsc::SendError(request)) = jobs.send(request) {
            log::error!("Asset loader worker is gone, dropping {}", request.url);
        }
    }
}

impl Drop for FileLoader {
    fn drop(&mut self) {
        // Closing the queue lets the worker finish what it has and exit
        self.jobs = None;
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

/// Maps a slide url to a path: `file://` prefixes are stripped and relative
/// paths are resolved against `root`.
pub fn resolve(root: &Path, url: &str) -> PathBuf {
    let path = Path::new(url.strip_prefix("file://").unwrap_or(url));
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase())
        .filter(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
}

/// Reads one asset, retrying transient IO failures per `policy`.
pub fn fetch_asset(root: &Path, url: &str, policy: &RetryPolicy) -> Result<Asset, AssetLoadError> {
    let path = resolve(root, url);
    with_retry(
        policy,
        |_| read_asset(&path),
        AssetLoadError::is_transient,
        thread::sleep,
    )
    .map_err(|failure| {
        if failure.attempts > 1 {
            AssetLoadError::Exhausted {
                attempts: failure.attempts,
                source: Box::new(failure.last_error),
            }
        } else {
            failure.last_error
        }
    })
}

pub fn read_asset(path: &Path) -> Result<Asset, AssetLoadError> {
    let extension = extension_of(path)
        .ok_or_else(|| AssetLoadError::Unsupported(path.display().to_string()))?;

    let bytes = fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => AssetLoadError::NotFound(path.to_path_buf()),
        _ => AssetLoadError::Io {
            path: path.to_path_buf(),
            source: e,
        },
    })?;

    // EXIF is only read reliably from JPEG containers
    let orientation = if extension == "jpg" || extension == "jpeg" {
        read_orientation(&bytes).unwrap_or_else(|| {
            log::debug!("No EXIF orientation for {}", path.display());
            1
        })
    } else {
        1
    };

    Ok(Asset {
        bytes,
        extension,
        orientation,
    })
}

/// EXIF orientation tag: 1 normal, 3 rotated 180, 6 rotated 90 CW,
/// 8 rotated 90 CCW. Flipped variants are reported as-is.
pub fn read_orientation(bytes: &[u8]) -> Option<u16> {
    let exif = Reader::new()
        .read_from_container(&mut Cursor::new(bytes))
        .ok()?;
    let field = exif.get_field(Tag::Orientation, In::PRIMARY)?;
    match &field.value {
        Value::Short(values) => values.first().copied(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn resolve_relative_and_file_urls() {
        let root = Path::new("/srv/slides");
        assert_eq!(resolve(root, "a.jpg"), PathBuf::from("/srv/slides/a.jpg"));
        assert_eq!(resolve(root, "file:///tmp/b.png"), PathBuf::from("/tmp/b.png"));
        assert_eq!(resolve(root, "/abs/c.gif"), PathBuf::from("/abs/c.gif"));
    }

    #[test]
    fn extension_filter() {
        assert_eq!(extension_of(Path::new("x.JPG")), Some("jpg".into()));
        assert_eq!(extension_of(Path::new("x.tiff")), None);
        assert_eq!(extension_of(Path::new("noext")), None);
    }

    #[test]
    fn read_png_defaults_orientation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slide.png");
        fs::write(&path, b"not really a png").unwrap();
        let asset = read_asset(&path).unwrap();
        assert_eq!(asset.extension, "png");
        assert_eq!(asset.orientation, 1);
        assert_eq!(asset.bytes, b"not really a png");
    }

    #[test]
    fn jpeg_without_exif_defaults_orientation() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("slide.jpg");
        fs::write(&path, [0xFF, 0xD8, 0xFF, 0xD9]).unwrap();
        assert_eq!(read_asset(&path).unwrap().orientation, 1);
    }

    #[test]
    fn missing_file_is_not_retried() {
        let tmp = TempDir::new().unwrap();
        let policy = RetryPolicy {
            max_attempts: 3,
            base_delay: Duration::from_secs(10),
            jitter: 0.0,
        };
        // Would sleep for 30s if it retried
        let err = fetch_asset(tmp.path(), "missing.jpg", &policy).unwrap_err();
        assert!(matches!(err, AssetLoadError::NotFound(_)));
    }

    #[test]
    fn unsupported_extension_fails_fast() {
        let tmp = TempDir::new().unwrap();
        let err = fetch_asset(tmp.path(), "clip.mp4", &RetryPolicy::default()).unwrap_err();
        assert!(matches!(err, AssetLoadError::Unsupported(_)));
    }

    #[test]
    fn file_loader_replies_on_channel() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("one.gif"), b"GIF89a").unwrap();
        let (tx, rx) = mpsc::channel();
        let mut loader = FileLoader::spawn(tmp.path(), RetryPolicy::none()).unwrap();
        loader.load(LoadRequest {
            index: 0,
            url: "one.gif".into(),
            reply: tx.clone(),
        });
        loader.load(LoadRequest {
            index: 1,
            url: "two.gif".into(),
            reply: tx,
        });
        drop(loader); // waits for the worker to drain its queue

        let mut completions: Vec<_> = rx.try_iter().collect();
        completions.sort_by_key(|c| c.index);
        assert_eq!(completions.len(), 2);
        assert_eq!(completions[0].result.as_ref().unwrap().bytes, b"GIF89a");
        assert!(completions[1].result.is_err());
    }

    #[test]
    fn reply_after_receiver_dropped_is_silent() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        let request = LoadRequest {
            index: 0,
            url: "a.png".into(),
            reply: tx,
        };
        request.complete(Err(AssetLoadError::Unsupported("a".into())));
    }
}
