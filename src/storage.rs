// src/storage.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::error::AppError;

/// Blob storage abstraction for uploaded media.
///
/// Keys are slash-separated paths such as `audio/<subject>/<name>.mp3`,
/// mirroring object-store key conventions.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError>;
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError>;
    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// Filesystem-backed blob store rooted at a configured directory.
pub struct FsStore {
    root: PathBuf,
}

impl FsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, AppError> {
        if key.is_empty() || key.starts_with('/') || key.split('/').any(|part| part == "..") {
            return Err(AppError::BadRequest(format!("Invalid storage key: {}", key)));
        }
        Ok(self.root.join(Path::new(key)))
    }
}

#[async_trait]
impl BlobStore for FsStore {
    async fn put(&self, key: &str, bytes: &[u8]) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        let path = self.resolve(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn rejects_path_traversal_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());
        assert!(store.put("../escape.bin", b"x").await.is_err());
        assert!(store.put("/abs.bin", b"x").await.is_err());
    }

    #[tokio::test]
    async fn put_get_delete_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(dir.path());

        store.put("audio/math/a.mp3", b"bytes").await.unwrap();
        assert_eq!(
            store.get("audio/math/a.mp3").await.unwrap().as_deref(),
            Some(b"bytes".as_slice())
        );

        store.delete("audio/math/a.mp3").await.unwrap();
        assert!(store.get("audio/math/a.mp3").await.unwrap().is_none());
    }
}
