pub mod local;
pub mod s3;

use bytes::Bytes;
use uuid::Uuid;

use crate::config::{Config, StorageBackendKind};
use local::LocalStorage;
use s3::S3Storage;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("object store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("object store error (status {status}): {message}")]
    Backend { status: u16, message: String },

    #[error("storage misconfigured: {0}")]
    Config(String),
}

pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// The process-wide storage capability. One variant is constructed at startup
/// from config and carried in `AppState`; callers never see which one.
#[derive(Clone)]
pub enum Storage {
    Local(LocalStorage),
    S3(S3Storage),
}

impl Storage {
    pub fn from_config(config: &Config) -> StorageResult<Self> {
        match config.storage_backend {
            StorageBackendKind::Local => {
                Ok(Storage::Local(LocalStorage::new(&config.uploads_dir)))
            }
            StorageBackendKind::S3 => Ok(Storage::S3(S3Storage::from_config(config)?)),
        }
    }

    pub async fn save(&self, key: &str, bytes: &Bytes) -> StorageResult<String> {
        check_key(key)?;
        match self {
            Storage::Local(inner) => inner.save(key, bytes).await,
            Storage::S3(inner) => inner.save(key, bytes).await,
        }
    }

    pub async fn retrieve(&self, key: &str) -> StorageResult<Bytes> {
        check_key(key)?;
        match self {
            Storage::Local(inner) => inner.retrieve(key).await,
            Storage::S3(inner) => inner.retrieve(key).await,
        }
    }

    /// NotFound is surfaced but is not fatal to cleanup callers.
    pub async fn delete(&self, key: &str) -> StorageResult<()> {
        check_key(key)?;
        match self {
            Storage::Local(inner) => inner.delete(key).await,
            Storage::S3(inner) => inner.delete(key).await,
        }
    }

    pub async fn exists(&self, key: &str) -> StorageResult<bool> {
        check_key(key)?;
        match self {
            Storage::Local(inner) => inner.exists(key).await,
            Storage::S3(inner) => inner.exists(key).await,
        }
    }

    /// A locator for the stored object. Not stable across backend swaps:
    /// a servable path for local, a presigned expiring URL for S3.
    pub fn url_for(&self, key: &str) -> StorageResult<String> {
        check_key(key)?;
        match self {
            Storage::Local(inner) => Ok(inner.url_for(key)),
            Storage::S3(inner) => inner.presigned_get_url(key),
        }
    }
}

/// Derive the storage key for a candidate's resume. Namespaced under the
/// candidate id with a server-generated file name, so nothing from the
/// client-supplied filename except a vetted extension reaches the key.
pub fn resume_key(candidate_id: Uuid, declared_filename: &str) -> StorageResult<String> {
    let ext = declared_filename
        .rsplit_once('.')
        .map(|(_, e)| e.to_ascii_lowercase())
        .ok_or_else(|| StorageError::InvalidKey(declared_filename.to_string()))?;
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::InvalidKey(declared_filename.to_string()));
    }
    Ok(format!("resumes/{}/{}.{}", candidate_id, Uuid::new_v4(), ext))
}

/// Keys are produced by `resume_key` and stored verbatim; anything with
/// traversal segments or an absolute prefix never reaches a backend.
fn check_key(key: &str) -> StorageResult<()> {
    if key.is_empty()
        || key.starts_with('/')
        || key.contains('\\')
        || key.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..")
    {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}
