use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

/// Which storage variant the process runs with. Decided once at startup;
/// nothing outside `storage::Storage::from_config` branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackendKind {
    Local,
    S3,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    pub database_url: String,
    pub admin_token: String,
    pub storage_backend: StorageBackendKind,
    pub uploads_dir: String,
    pub max_resume_bytes: usize,
    pub notification_webhook_url: Option<String>,
    // S3-compatible object store; only read when STORAGE_BACKEND=s3.
    pub s3_endpoint: Option<String>,
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    pub s3_access_key: Option<String>,
    pub s3_secret_key: Option<String>,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

const DEFAULT_MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let storage_backend = match env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .as_str()
        {
            "local" => StorageBackendKind::Local,
            "s3" => StorageBackendKind::S3,
            other => {
                return Err(Error::Config(format!(
                    "Unsupported storage backend: {}",
                    other
                )))
            }
        };

        Ok(Self {
            server_address: get_env("SERVER_ADDRESS")?,
            database_url: get_env("DATABASE_URL")?,
            admin_token: get_env("ADMIN_TOKEN")?,
            storage_backend,
            uploads_dir: env::var("UPLOADS_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            max_resume_bytes: match env::var("MAX_RESUME_BYTES") {
                Ok(raw) => raw
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid value for MAX_RESUME_BYTES: {}", e)))?,
                Err(_) => DEFAULT_MAX_RESUME_BYTES,
            },
            notification_webhook_url: env::var("NOTIFICATION_WEBHOOK_URL").ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION").ok(),
            s3_access_key: env::var("S3_ACCESS_KEY").ok(),
            s3_secret_key: env::var("S3_SECRET_KEY").ok(),
        })
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
