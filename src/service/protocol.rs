//! Search Service HTTP Protocol
//!
//! Endpoints and response bodies shared by the search service and the proxy
//! in front of it. Bodies are flat JSON objects keyed by `message`; the proxy
//! relays them verbatim.

use serde::{Deserialize, Serialize};

// --- API Endpoints ---

/// Liveness / info message (proxy: the client page).
pub const ENDPOINT_ROOT: &str = "/";
/// Form-encoded insert, field `text`.
pub const ENDPOINT_INSERT: &str = "/insert";
/// Best-match search, query parameter `query`.
pub const ENDPOINT_SEARCH: &str = "/search";
/// Engine reachability and document count.
pub const ENDPOINT_HEALTH: &str = "/health";

// --- Messages ---

pub const MSG_STORED: &str = "Stored successfully";
pub const MSG_STORE_FAILED: &str = "Failed to store data";
pub const MSG_FOUND: &str = "Best document found";
pub const MSG_NO_DATA: &str = "No data";
pub const MSG_ENGINE_UNAVAILABLE: &str = "Search engine unavailable";
pub const MSG_BACKEND_ERROR: &str = "Backend error";

// --- Data Transfer Objects ---

#[derive(Debug, Serialize, Deserialize)]
pub struct InsertForm {
    pub text: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SearchParams {
    pub query: String,
}

/// Body of every `/`, `/insert` and `/search` response.
///
/// Only `message` is always present; `id`/`text` accompany a document and
/// `error` describes a failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            id: None,
            text: None,
            error: None,
        }
    }

    pub fn document(message: impl Into<String>, id: String, text: String) -> Self {
        Self {
            id: Some(id),
            text: Some(text),
            ..Self::message(message)
        }
    }

    pub fn error(message: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::message(message)
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub index: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
