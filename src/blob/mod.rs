use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use thiserror::Error;

use crate::models::Blob;
use crate::store::{Store, StoreError};

#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Blob service rejected upload ({status}): {body}")]
    Rejected { status: u16, body: String },
}

pub type BlobResult<T> = Result<T, BlobError>;

/// Object storage that accepts a file and hands back a public URL for it.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, name: &str, content_type: Option<&str>, data: Vec<u8>) -> BlobResult<String>;
}

/// Reduce a client-supplied filename to a single safe path segment
pub fn sanitize_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '-'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '-']);

    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}

// ==================== SQLite Backend ====================

/// Keeps uploaded bytes in the local database; this process serves them back
/// from `/api/blobs/{id}/{name}`.
pub struct SqliteBlobStore {
    store: Arc<Store>,
    public_base_url: String,
}

impl SqliteBlobStore {
    pub fn new(store: Arc<Store>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_string();
        Self { store, public_base_url }
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn put(&self, name: &str, content_type: Option<&str>, data: Vec<u8>) -> BlobResult<String> {
        let filename = sanitize_name(name);
        let mut blob = Blob {
            id: String::new(),
            filename: filename.clone(),
            content_type: content_type
                .unwrap_or("application/octet-stream")
                .to_string(),
            size: 0,
            data,
            created_at: Utc::now(),
        };
        self.store.create_blob(&mut blob)?;

        log::debug!("Stored blob {} ({} bytes)", blob.id, blob.size);
        Ok(format!("{}/api/blobs/{}/{}", self.public_base_url, blob.id, filename))
    }
}

// ==================== Remote Backend ====================

pub const DEFAULT_REMOTE_ENDPOINT: &str = "https://blob.vercel-storage.com";

#[derive(Deserialize)]
struct RemotePutResponse {
    url: String,
}

/// Uploads to a Vercel-Blob-style HTTP object store: `PUT {endpoint}/{name}`
/// with a bearer token, answered by JSON carrying the public `url`.
pub struct RemoteBlobStore {
    client: Client,
    endpoint: String,
    token: String,
}

impl RemoteBlobStore {
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            token: token.into(),
        }
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/{}", self.endpoint, sanitize_name(name))
    }
}

#[async_trait]
impl BlobStore for RemoteBlobStore {
    async fn put(&self, name: &str, content_type: Option<&str>, data: Vec<u8>) -> BlobResult<String> {
        let mut request = self
            .client
            .put(self.object_url(name))
            .bearer_auth(&self.token)
            .header("x-add-random-suffix", "1")
            .body(data);
        if let Some(ct) = content_type {
            request = request.header("x-content-type", ct);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(BlobError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let put: RemotePutResponse = response.json().await?;
        Ok(put.url)
    }
}
