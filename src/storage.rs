use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};
use thiserror::Error;
use tokio::fs::{self, File};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use uuid::Uuid;

/// Well-known path of the global curated examples source.
pub const CURATED_GLOBAL_PATH: &str = "curated/global.jsonl";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found")]
    NotFound,
    #[error("invalid object path")]
    InvalidPath,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl StorageError {
    fn from_io(e: std::io::Error) -> Self {
        if e.kind() == ErrorKind::NotFound {
            Self::NotFound
        } else {
            Self::Io(e)
        }
    }
}

/// On-disk object store for knowledge sources (curated JSONL plus uploaded
/// assets), rooted at `<data_dir>/knowledge`. Uploaded objects are
/// content-addressed by SHA-256, so re-uploading identical bytes lands on
/// the same path.
pub struct KnowledgeStorage {
    base_path: PathBuf,
}

impl KnowledgeStorage {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            base_path: data_dir.join("knowledge"),
        }
    }

    /// Resolves a relative object path, rejecting absolute paths and parent
    /// traversal.
    fn full_path(&self, rel: &str) -> Result<PathBuf, StorageError> {
        let rel_path = Path::new(rel);
        let safe = rel_path
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if rel.is_empty() || !safe {
            return Err(StorageError::InvalidPath);
        }
        Ok(self.base_path.join(rel_path))
    }

    fn temp_path(&self) -> PathBuf {
        self.base_path.join("tmp").join(Uuid::new_v4().to_string())
    }

    async fn write_atomic(&self, final_path: &Path, data: &[u8]) -> Result<(), StorageError> {
        let temp_path = self.temp_path();
        if let Some(parent) = temp_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut temp_file = File::create(&temp_path).await?;
        temp_file.write_all(data).await?;
        temp_file.sync_all().await?;

        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::rename(&temp_path, final_path).await?;

        Ok(())
    }

    /// Stores an uploaded object and returns its content-addressed path,
    /// e.g. `objects/a6/a665a4...`.
    pub async fn put(&self, data: &[u8]) -> Result<String, StorageError> {
        let mut hasher = Sha256::new();
        hasher.update(data);
        let oid = hex::encode(hasher.finalize());

        let rel = format!("objects/{}/{}", &oid[0..2], oid);
        let final_path = self.full_path(&rel)?;
        self.write_atomic(&final_path, data).await?;

        Ok(rel)
    }

    /// Replaces the global curated source.
    pub async fn put_curated(&self, data: &[u8]) -> Result<(), StorageError> {
        let final_path = self.full_path(CURATED_GLOBAL_PATH)?;
        self.write_atomic(&final_path, data).await
    }

    /// Reads at most `max` bytes of an object. The byte budget is enforced
    /// here, at the I/O edge, so an oversized source never reaches memory
    /// in full.
    pub async fn read_capped(&self, rel: &str, max: usize) -> Result<Vec<u8>, StorageError> {
        let path = self.full_path(rel)?;
        let file = File::open(&path).await.map_err(StorageError::from_io)?;

        let mut data = Vec::new();
        file.take(max as u64).read_to_end(&mut data).await?;

        Ok(data)
    }

    pub async fn exists(&self, rel: &str) -> bool {
        match self.full_path(rel) {
            Ok(path) => fs::try_exists(&path).await.unwrap_or(false),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_put_and_read() {
        let temp_dir = TempDir::new().unwrap();
        let storage = KnowledgeStorage::new(temp_dir.path());

        let rel = storage.put(b"{\"input_prompt\":\"x\"}").await.unwrap();
        assert!(rel.starts_with("objects/"));
        assert!(storage.exists(&rel).await);

        let data = storage.read_capped(&rel, 1024).await.unwrap();
        assert_eq!(data, b"{\"input_prompt\":\"x\"}");
    }

    #[tokio::test]
    async fn test_put_is_content_addressed() {
        let temp_dir = TempDir::new().unwrap();
        let storage = KnowledgeStorage::new(temp_dir.path());

        let a = storage.put(b"same bytes").await.unwrap();
        let b = storage.put(b"same bytes").await.unwrap();
        assert_eq!(a, b);

        let c = storage.put(b"other bytes").await.unwrap();
        assert_ne!(a, c);
    }

    #[tokio::test]
    async fn test_read_capped_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let storage = KnowledgeStorage::new(temp_dir.path());

        let rel = storage.put(&vec![b'x'; 1000]).await.unwrap();
        let data = storage.read_capped(&rel, 64).await.unwrap();
        assert_eq!(data.len(), 64);
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let temp_dir = TempDir::new().unwrap();
        let storage = KnowledgeStorage::new(temp_dir.path());

        let err = storage
            .read_capped("objects/aa/missing", 1024)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn test_rejects_traversal() {
        let temp_dir = TempDir::new().unwrap();
        let storage = KnowledgeStorage::new(temp_dir.path());

        for bad in ["../outside", "/etc/passwd", ""] {
            let err = storage.read_capped(bad, 1024).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidPath), "path: {bad}");
        }
    }

    #[tokio::test]
    async fn test_put_curated_lands_on_global_path() {
        let temp_dir = TempDir::new().unwrap();
        let storage = KnowledgeStorage::new(temp_dir.path());

        storage.put_curated(b"line\n").await.unwrap();
        assert!(storage.exists(CURATED_GLOBAL_PATH).await);

        let data = storage
            .read_capped(CURATED_GLOBAL_PATH, 1024)
            .await
            .unwrap();
        assert_eq!(data, b"line\n");
    }
}
