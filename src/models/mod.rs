use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Thought is a single journal entry: a short text note with an optional image.
/// Thoughts are created and deleted, never edited.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Thought {
    pub id: i64,
    pub content: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Blob stores uploaded image bytes for the built-in blob backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub id: String,
    pub filename: String,
    pub content_type: String,
    pub size: i64,
    #[serde(skip_serializing, default)]
    pub data: Vec<u8>,
    pub created_at: DateTime<Utc>,
}

// Request/Response types for API
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateThoughtRequest {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Clients send the id either as a JSON number or as a numeric string.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ThoughtId {
    Number(i64),
    Text(String),
}

impl ThoughtId {
    pub fn parse(&self) -> Option<i64> {
        match self {
            ThoughtId::Number(n) => Some(*n),
            ThoughtId::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct DeleteThoughtRequest {
    pub id: ThoughtId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub url: String,
}

/// Status envelope: `{"success": true}` or `{"success": false, "error": "..."}`
#[derive(Debug, Serialize)]
pub struct ApiResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(msg.into()),
        }
    }
}
