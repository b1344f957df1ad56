//! Memory management API
//!
//! Wire types for the capture, memory CRUD, interest and model routes.
//! Response types also derive `Deserialize` so `recall-cli` can read them.

pub mod handlers;

use serde::{Deserialize, Serialize};

use crate::memory::MemoryEntry;

/// Body of `/add_page` and `/add_ocr` responses
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl IngestResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            message: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListMemoriesQuery {
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryListResponse {
    pub results: Vec<MemoryEntry>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddMemoryRequest {
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateMemoryRequest {
    pub content: Option<String>,
}

/// `{"status": "updated", "id": ...}` or `{"status": "deleted"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveModelResponse {
    pub model: String,
    pub provider: String,
}
