//! Slide data sources.
//!
//! A directory of images becomes one slide per file, sorted by file name.
//! The title comes from the file stem (`010-river_bend.jpg` → "river bend")
//! and the description from a sidecar text file with the same stem.
//! A TOML manifest lists slides explicitly:
//!
//! ```toml
//! [[slides]]
//! url = "hero/school.jpg"
//! title = "The new school"
//! description = "Opened in spring"
//! ```

use crate::error::SourceError;
use crate::loader::extension_of;
use crate::slide::SlideDescriptor;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Deserialize)]
struct Manifest {
    #[serde(default)]
    slides: Vec<SlideDescriptor>,
}

pub fn load_manifest(path: &Path) -> Result<Vec<SlideDescriptor>, SourceError> {
    let content = fs::read_to_string(path)?;
    parse_manifest(&content)
}

pub fn parse_manifest(content: &str) -> Result<Vec<SlideDescriptor>, SourceError> {
    let manifest: Manifest = toml::from_str(content)?;
    Ok(manifest.slides)
}

/// Builds slides from the image files directly inside `dir`. Urls are
/// relative to `dir`.
pub fn scan_dir(dir: &Path) -> Result<Vec<SlideDescriptor>, SourceError> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && extension_of(&path).is_some() {
            paths.push(path);
        }
    }
    if paths.is_empty() {
        return Err(SourceError::Empty(dir.to_path_buf()));
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let slides = paths
        .iter()
        .filter_map(|path| {
            let url = path.file_name()?.to_str()?.to_string();
            let stem = path.file_stem()?.to_str()?;
            Some(SlideDescriptor {
                url,
                title: title_from_stem(stem),
                description: sidecar_description(path),
            })
        })
        .collect();
    Ok(slides)
}

/// Drops a leading numeric ordering prefix and turns separators into spaces.
pub fn title_from_stem(stem: &str) -> String {
    let trimmed = match stem.split_once('-') {
        Some((prefix, rest)) if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit()) => rest,
        _ => stem,
    };
    trimmed
        .split(['-', '_'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn sidecar_description(image: &Path) -> String {
    fs::read_to_string(image.with_extension("txt"))
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}
