//! Storage Module
//!
//! Abstraction over where image files live. The catalog service only
//! needs two things: turn uploaded bytes into addressable files, and
//! delete files whose database rows were removed (or whose transaction
//! rolled back).

use std::path::PathBuf;

use async_trait::async_trait;
use shared::models::{ImageFileSet, StoredFile};
use tokio::fs;
use uuid::Uuid;

use crate::utils::AppError;

/// The size slots produced for every uploaded image.
const SIZE_SLOTS: &[&str] = &["thumb", "medium", "large"];

#[async_trait]
pub trait FileStorage: Send + Sync {
    /// Persist one uploaded image in all three sizes and return its
    /// keys and public URLs.
    async fn store_image(&self, data: &[u8]) -> Result<ImageFileSet, AppError>;

    /// Best-effort removal of stored files by key. Missing keys are not
    /// an error; callers use this for rollback and post-delete cleanup.
    async fn delete_by_keys(&self, keys: &[String]) -> Result<(), AppError>;
}

/// Filesystem-backed storage under `<work_dir>/images`.
pub struct LocalFileStorage {
    images_dir: PathBuf,
    public_base: String,
}

impl LocalFileStorage {
    pub async fn new(work_dir: &str, public_base: &str) -> Result<Self, AppError> {
        let images_dir = PathBuf::from(work_dir).join("images");
        fs::create_dir_all(&images_dir)
            .await
            .map_err(|e| AppError::internal(format!("Failed to create images dir: {e}")))?;
        Ok(Self {
            images_dir,
            public_base: public_base.trim_end_matches('/').to_string(),
        })
    }

    fn entry(&self, key: &str) -> StoredFile {
        StoredFile {
            key: key.to_string(),
            url: format!("{}/{}", self.public_base, key),
        }
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store_image(&self, data: &[u8]) -> Result<ImageFileSet, AppError> {
        let id = Uuid::new_v4();
        let mut written: Vec<String> = Vec::with_capacity(SIZE_SLOTS.len());

        for slot in SIZE_SLOTS {
            let key = format!("{id}_{slot}.jpg");
            let path = self.images_dir.join(&key);
            if let Err(e) = fs::write(&path, data).await {
                // Roll back the slots already written
                self.delete_by_keys(&written).await.ok();
                return Err(AppError::internal(format!("Failed to store image: {e}")));
            }
            written.push(key);
        }

        Ok(ImageFileSet {
            thumb: self.entry(&written[0]),
            medium: self.entry(&written[1]),
            large: self.entry(&written[2]),
        })
    }

    async fn delete_by_keys(&self, keys: &[String]) -> Result<(), AppError> {
        for key in keys {
            let path = self.images_dir.join(key);
            if let Err(e) = fs::remove_file(&path).await
                && e.kind() != std::io::ErrorKind::NotFound
            {
                tracing::warn!(key = %key, error = %e, "Failed to delete stored file");
            }
        }
        Ok(())
    }
}

/// No-op storage for tests.
pub struct NoopFileStorage;

#[async_trait]
impl FileStorage for NoopFileStorage {
    async fn store_image(&self, _data: &[u8]) -> Result<ImageFileSet, AppError> {
        let id = Uuid::new_v4();
        let entry = |slot: &str| StoredFile {
            key: format!("{id}_{slot}.jpg"),
            url: format!("http://localhost/images/{id}_{slot}.jpg"),
        };
        Ok(ImageFileSet {
            thumb: entry("thumb"),
            medium: entry("medium"),
            large: entry("large"),
        })
    }

    async fn delete_by_keys(&self, _keys: &[String]) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_and_delete() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalFileStorage::new(dir.path().to_str().unwrap(), "http://localhost/img")
            .await
            .unwrap();

        let set = storage.store_image(b"fake image bytes").await.unwrap();
        assert!(set.thumb.url.starts_with("http://localhost/img/"));
        assert!(dir.path().join("images").join(&set.thumb.key).exists());

        storage
            .delete_by_keys(&[
                set.thumb.key.clone(),
                set.medium.key.clone(),
                set.large.key.clone(),
            ])
            .await
            .unwrap();
        assert!(!dir.path().join("images").join(&set.thumb.key).exists());

        // Deleting again is not an error
        storage.delete_by_keys(&[set.thumb.key]).await.unwrap();
    }
}
