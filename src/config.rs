use std::env;
use thiserror::Error;

use crate::blob::DEFAULT_REMOTE_ENDPOINT;

pub const DEFAULT_PORT: u16 = 8069;
pub const DEFAULT_PASSPHRASE: &str = "thoughts";
pub const DEFAULT_PAYLOAD_LIMIT: usize = 50 * 1024 * 1024;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key} has invalid value '{value}'")]
    Invalid { key: &'static str, value: String },
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("Unknown BLOB_BACKEND '{0}' (expected 'sqlite' or 'remote')")]
    UnknownBackend(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum BlobBackend {
    /// Bytes live in the thoughts database and are served by this process
    Sqlite { public_base_url: String },
    /// Bytes go to an external object store
    Remote { endpoint: String, token: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub port: u16,
    pub database_path: String,
    /// Browser-side gate only; no handler checks it
    pub passphrase: String,
    pub blob_backend: BlobBackend,
    pub payload_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = match lookup("PORT") {
            Some(v) => v.parse().map_err(|_| ConfigError::Invalid { key: "PORT", value: v })?,
            None => DEFAULT_PORT,
        };

        let payload_limit = match lookup("PAYLOAD_LIMIT_BYTES") {
            Some(v) => v
                .parse()
                .map_err(|_| ConfigError::Invalid { key: "PAYLOAD_LIMIT_BYTES", value: v })?,
            None => DEFAULT_PAYLOAD_LIMIT,
        };

        let passphrase = lookup("THOUGHTS_PASSPHRASE")
            .filter(|p| !p.is_empty())
            .unwrap_or_else(|| {
                log::warn!("THOUGHTS_PASSPHRASE not set, using default");
                DEFAULT_PASSPHRASE.to_string()
            });

        let backend = lookup("BLOB_BACKEND").unwrap_or_else(|| "sqlite".to_string());
        let blob_backend = match backend.to_ascii_lowercase().as_str() {
            "sqlite" => BlobBackend::Sqlite {
                public_base_url: lookup("PUBLIC_BASE_URL").unwrap_or_default(),
            },
            "remote" => BlobBackend::Remote {
                endpoint: lookup("BLOB_API_URL")
                    .unwrap_or_else(|| DEFAULT_REMOTE_ENDPOINT.to_string()),
                token: lookup("BLOB_READ_WRITE_TOKEN")
                    .filter(|t| !t.is_empty())
                    .ok_or(ConfigError::Missing("BLOB_READ_WRITE_TOKEN"))?,
            },
            _ => return Err(ConfigError::UnknownBackend(backend)),
        };

        Ok(Config {
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            database_path: lookup("DATABASE_PATH").unwrap_or_else(|| "thoughts.db".to_string()),
            passphrase,
            blob_backend,
            payload_limit,
        })
    }
}
