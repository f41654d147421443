//! Uploaded image storage.
//!
//! Files live under the configured media root, in `images/` for products
//! and `logos/` for suppliers. Records store the media-relative path, which
//! is also the URL path below `/media/`.

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use crate::models::{DEFAULT_IMAGE, DEFAULT_LOGO};

/// Errors from media file operations.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid media path: {0}")]
    InvalidPath(String),
}

/// Which upload directory a file belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    ProductImage,
    SupplierLogo,
}

impl MediaKind {
    const fn directory(self) -> &'static str {
        match self {
            Self::ProductImage => "images",
            Self::SupplierLogo => "logos",
        }
    }
}

/// Filesystem store for uploaded images.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Write an upload and return its media-relative path.
    ///
    /// The stored name is the sanitized original name behind a timestamp
    /// prefix, so repeated uploads of the same file never collide.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::Io` if the directory or file cannot be written.
    pub async fn save(
        &self,
        kind: MediaKind,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, MediaError> {
        let dir = self.root.join(kind.directory());
        tokio::fs::create_dir_all(&dir).await?;

        let file_name = format!(
            "{}_{}",
            chrono::Utc::now().timestamp_micros(),
            sanitize_file_name(original_name)
        );
        tokio::fs::write(dir.join(&file_name), bytes).await?;

        let relative = format!("{}/{file_name}", kind.directory());
        tracing::debug!(path = %relative, size = bytes.len(), "Stored upload");
        Ok(relative)
    }

    /// Delete a stored file.
    ///
    /// Returns `false` when there was nothing to delete: the path is one of
    /// the shared default images, empty, or already gone.
    ///
    /// # Errors
    ///
    /// Returns `MediaError::InvalidPath` for paths that leave the media root
    /// and `MediaError::Io` for any failure other than a missing file.
    pub async fn remove(&self, relative: &str) -> Result<bool, MediaError> {
        if relative.is_empty() || relative == DEFAULT_IMAGE || relative == DEFAULT_LOGO {
            return Ok(false);
        }

        let path = Path::new(relative);
        if !path.components().all(|c| matches!(c, Component::Normal(_))) {
            return Err(MediaError::InvalidPath(relative.to_string()));
        }

        match tokio::fs::remove_file(self.root.join(path)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    /// [`Self::remove`], logging instead of failing.
    ///
    /// Used where the file going away is best-effort, such as before a
    /// record delete.
    pub async fn remove_logged(&self, relative: &str) {
        if let Err(e) = self.remove(relative).await {
            tracing::warn!(path = %relative, "Failed to remove media file: {e}");
        }
    }
}

/// Keep the last path segment of an uploaded name, restricted to a safe
/// character set.
fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("milk.png"), "milk.png");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\my cat.jpg"), "my_cat.jpg");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "upload");
    }

    #[tokio::test]
    async fn test_save_then_remove() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        let relative = store
            .save(MediaKind::ProductImage, "milk.png", b"png")
            .await
            .unwrap();

        assert!(relative.starts_with("images/"));
        assert!(relative.ends_with("_milk.png"));
        assert_eq!(std::fs::read(dir.path().join(&relative)).unwrap(), b"png");

        assert!(store.remove(&relative).await.unwrap());
        assert!(!dir.path().join(&relative).exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_not_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        assert!(!store.remove("logos/gone.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_default_images_are_never_removed() {
        let dir = tempfile::tempdir().unwrap();
        let default = dir.path().join(DEFAULT_LOGO);
        std::fs::create_dir_all(default.parent().unwrap()).unwrap();
        std::fs::write(&default, b"logo").unwrap();
        let store = MediaStore::new(dir.path());

        assert!(!store.remove(DEFAULT_LOGO).await.unwrap());
        assert!(default.exists());
    }

    #[tokio::test]
    async fn test_remove_rejects_escaping_paths() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path());

        assert!(matches!(
            store.remove("../secret.txt").await,
            Err(MediaError::InvalidPath(_))
        ));
        assert!(matches!(
            store.remove("/etc/passwd").await,
            Err(MediaError::InvalidPath(_))
        ));
    }
}
