//! Media attachment lookup
//!
//! Attachments are known by a fixed basename; the actual file may carry any
//! of the supported image or audio extensions.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::{AUDIO_EXTENSIONS, IMAGE_EXTENSIONS};

/// Errors that can occur while looking up media files
#[derive(Error, Debug)]
pub enum MediaError {
    /// The media directory could not be listed
    #[error("Cannot list media directory {dir}: {source}")]
    Io {
        /// Directory being scanned
        dir: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

/// Returns true if `ext` is one of the supported media extensions.
///
/// # Examples
///
/// ```
/// use persona_relay::media::is_media_extension;
/// assert!(is_media_extension("JPG"));
/// assert!(is_media_extension("ogg"));
/// assert!(!is_media_extension("txt"));
/// ```
#[must_use]
pub fn is_media_extension(ext: &str) -> bool {
    let ext = ext.to_lowercase();
    IMAGE_EXTENSIONS.contains(&ext.as_str()) || AUDIO_EXTENSIONS.contains(&ext.as_str())
}

fn matches_basename(path: &Path, basename: &str) -> bool {
    let stem = path.file_stem().and_then(|s| s.to_str());
    let ext = path.extension().and_then(|s| s.to_str());
    match (stem, ext) {
        (Some(stem), Some(ext)) => stem == basename && is_media_extension(ext),
        _ => false,
    }
}

/// Resolves media basenames against a single directory.
#[derive(Debug, Clone)]
pub struct MediaLocator {
    dir: PathBuf,
}

impl MediaLocator {
    /// Create a locator scanning `dir`
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Directory being scanned
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Find the first file named `<basename>.<media extension>`.
    ///
    /// Entries are visited in directory listing order, which the platform
    /// does not guarantee to be stable; with several candidates any one of
    /// them may be returned.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the directory cannot be listed.
    pub async fn find(&self, basename: &str) -> Result<Option<PathBuf>, MediaError> {
        let io_err = |source| MediaError::Io {
            dir: self.dir.clone(),
            source,
        };

        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(io_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let path = entry.path();
            if !matches_basename(&path, basename) {
                continue;
            }
            if tokio::fs::metadata(&path)
                .await
                .is_ok_and(|meta| meta.is_file())
            {
                return Ok(Some(std::path::absolute(&path).unwrap_or(path)));
            }
        }

        Ok(None)
    }
}
