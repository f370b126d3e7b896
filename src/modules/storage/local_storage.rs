//! Local filesystem storage for report photos
//!
//! Files are written under the upload directory as `{8 hex}_{sanitised name}`
//! and referenced by their path relative to that directory.

use async_trait::async_trait;
use rand::RngCore;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::shared::validation::UNSAFE_FILENAME_CHARS;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    #[error("Failed to write file '{path}': {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Destination for uploaded photos
#[async_trait]
pub trait PhotoStorage: Send + Sync {
    /// Store the bytes and return a stable reference to them
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError>;

    /// Remove a stored photo; failures are logged, never returned
    async fn delete(&self, reference: &str);
}

/// Reduce a client-supplied filename to a safe basename
pub fn sanitize_filename(filename: &str) -> Option<String> {
    let basename = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned = UNSAFE_FILENAME_CHARS.replace_all(basename, "_");
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '_') {
        None
    } else {
        Some(cleaned.to_string())
    }
}

fn random_prefix() -> String {
    let mut bytes = [0u8; 4];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

pub struct LocalPhotoStorage {
    root: PathBuf,
}

impl LocalPhotoStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Create the upload directory if it does not exist yet
    pub async fn ensure_root_exists(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.root).await?;
        info!("Upload directory ready: {}", self.root.display());
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, reference: &str) -> Option<PathBuf> {
        // References are bare file names; anything else did not come from save()
        if reference.is_empty() || reference.contains(['/', '\\']) || reference.starts_with('.') {
            return None;
        }
        Some(self.root.join(reference))
    }
}

#[async_trait]
impl PhotoStorage for LocalPhotoStorage {
    async fn save(&self, filename: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let safe_name = sanitize_filename(filename)
            .ok_or_else(|| StorageError::InvalidFilename(filename.to_string()))?;

        let reference = format!("{}_{}", random_prefix(), safe_name);
        let path = self.root.join(&reference);

        tokio::fs::write(&path, bytes)
            .await
            .map_err(|source| StorageError::Write {
                path: path.display().to_string(),
                source,
            })?;

        debug!("Stored photo {} ({} bytes)", reference, bytes.len());
        Ok(reference)
    }

    async fn delete(&self, reference: &str) {
        let Some(path) = self.resolve(reference) else {
            warn!("Refusing to delete unexpected photo reference: {}", reference);
            return;
        };

        match tokio::fs::remove_file(&path).await {
            Ok(()) => info!("Removed photo {}", reference),
            Err(e) => warn!("Failed to remove photo {}: {}", reference, e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(
            sanitize_filename("foto banjir (1).jpg").as_deref(),
            Some("foto_banjir_1_.jpg")
        );
        assert_eq!(
            sanitize_filename("../../etc/passwd").as_deref(),
            Some("passwd")
        );
        assert_eq!(
            sanitize_filename("C:\\Users\\budi\\banjir.png").as_deref(),
            Some("banjir.png")
        );
        assert_eq!(sanitize_filename(".hidden.gif").as_deref(), Some("hidden.gif"));
        assert_eq!(sanitize_filename("   "), None);
        assert_eq!(sanitize_filename("???"), None);
    }

    #[tokio::test]
    async fn test_save_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path());

        let reference = tokio_test::assert_ok!(storage.save("banjir.jpg", b"jpeg-bytes").await);
        assert!(reference.ends_with("_banjir.jpg"));
        assert_eq!(reference.len(), "12345678_banjir.jpg".len());

        let stored = tokio::fs::read(dir.path().join(&reference)).await.unwrap();
        assert_eq!(stored, b"jpeg-bytes");

        storage.delete(&reference).await;
        assert!(!dir.path().join(&reference).exists());

        // Deleting twice is harmless
        storage.delete(&reference).await;
    }

    #[tokio::test]
    async fn test_delete_ignores_paths_outside_root() {
        let dir = tempfile::tempdir().unwrap();
        let outside = dir.path().join("keep.txt");
        tokio::fs::write(&outside, b"x").await.unwrap();

        let storage = LocalPhotoStorage::new(dir.path().join("uploads"));
        storage.delete("../keep.txt").await;
        assert!(outside.exists());
    }

    #[tokio::test]
    async fn test_ensure_root_exists() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path().join("nested").join("uploads"));
        storage.ensure_root_exists().await.unwrap();
        assert!(storage.root().is_dir());
    }

    #[tokio::test]
    async fn test_save_rejects_unusable_name() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalPhotoStorage::new(dir.path());
        assert!(matches!(
            storage.save("///", b"x").await,
            Err(StorageError::InvalidFilename(_))
        ));
    }
}
