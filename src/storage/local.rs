use std::io::ErrorKind;
use std::path::PathBuf;

use bytes::Bytes;
use tokio::fs;

use super::{StorageError, StorageResult};

/// Filesystem-backed storage under a configured uploads root. Keys map
/// directly to relative paths below the root; `url_for` returns the path the
/// `/uploads` static service exposes.
#[derive(Clone)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(key)
    }

    pub async fn save(&self, key: &str, bytes: &Bytes) -> StorageResult<String> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, bytes).await?;
        Ok(key.to_string())
    }

    pub async fn retrieve(&self, key: &str) -> StorageResult<Bytes> {
        match fs::read(self.path_for(key)).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        match fs::remove_file(self.path_for(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(StorageError::NotFound(key.to_string()))
            }
            Err(err) => Err(err.into()),
        }
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        match fs::metadata(self.path_for(key)).await {
            Ok(_) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    pub fn url_for(&self, key: &str) -> String {
        format!("/uploads/{}", key)
    }
}
