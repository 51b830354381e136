//! I/O helpers for images and JSON.
//!
//! - `load_rgb_image`: read a PNG/JPEG into an owned RGB `ImageF32` in `[0, 1]`.
//! - `write_json_file`: pretty-print a serializable value to disk.
use super::ImageF32;
use crate::error::ConfigError;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load an image from disk and convert to 3-channel f32 samples in `[0, 1]`.
pub fn load_rgb_image(path: &Path) -> Result<ImageF32, ConfigError> {
    let img = image::open(path)
        .map_err(|source| ConfigError::Image {
            path: path.to_path_buf(),
            source,
        })?
        .into_rgb8();
    let width = img.width() as usize;
    let height = img.height() as usize;
    let data = img
        .into_raw()
        .into_iter()
        .map(|v| v as f32 / 255.0)
        .collect();
    ImageF32::from_raw(width, height, 3, data).ok_or_else(|| {
        ConfigError::Invalid(format!("decoded buffer size mismatch for {}", path.display()))
    })
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

fn ensure_parent_dir(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }
    Ok(())
}
