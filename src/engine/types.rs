//! Engine Types
//!
//! The contract between the document pipeline and whatever full-text engine
//! sits underneath it. Request bodies and documents travel as raw JSON
//! (`serde_json::Value`) in the engine's own query DSL so that the store
//! owns the request shape and the engine only executes it.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use thiserror::Error;

/// Everything that can go wrong while talking to the search engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Liveness checks kept failing until the retry policy gave up.
    #[error("search engine unavailable after {attempts} attempt(s): {last_error}")]
    ConnectionUnavailable { attempts: u32, last_error: String },

    /// The index existence check or creation kept failing.
    #[error("failed to bootstrap index '{index}' after {attempts} attempt(s): {last_error}")]
    IndexBootstrap {
        index: String,
        attempts: u32,
        last_error: String,
    },

    /// A single engine call exceeded the configured per-call timeout.
    #[error("search engine call timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),

    /// The engine answered with a non-success status code.
    #[error("search engine returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid response from search engine: {0}")]
    InvalidResponse(String),

    /// A create-only write hit an existing document id.
    #[error("document '{id}' already exists")]
    Conflict { id: String },

    #[error("invalid engine configuration: {0}")]
    Config(String),
}

/// How a field is indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exact-match, not analyzed.
    Keyword,
    /// Analyzed full text.
    Text,
}

impl FieldKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Keyword => "keyword",
            FieldKind::Text => "text",
        }
    }
}

/// Field mappings of an index. Fixed once the index is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSchema {
    pub fields: Vec<(String, FieldKind)>,
}

impl IndexSchema {
    /// The schema used by the document store: `id` keyword, `text` full text.
    pub fn documents() -> Self {
        Self {
            fields: vec![
                ("id".to_string(), FieldKind::Keyword),
                ("text".to_string(), FieldKind::Text),
            ],
        }
    }

    pub fn field_kind(&self, name: &str) -> Option<FieldKind> {
        self.fields
            .iter()
            .find(|(field, _)| field == name)
            .map(|(_, kind)| *kind)
    }

    /// Renders the `mappings` section of an index creation request.
    pub fn to_mappings(&self) -> Value {
        let properties: serde_json::Map<String, Value> = self
            .fields
            .iter()
            .map(|(name, kind)| (name.clone(), json!({ "type": kind.as_str() })))
            .collect();

        json!({ "properties": properties })
    }
}

/// The minimal set of engine operations the pipeline relies on.
///
/// Implementations must be safe for concurrent use; the pipeline shares one
/// instance across all request handlers.
#[async_trait]
pub trait SearchEngine: Send + Sync {
    /// Lightweight liveness check.
    async fn ping(&self) -> Result<(), EngineError>;

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError>;

    /// Creates the index. An index that already exists is not an error.
    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<(), EngineError>;

    /// Number of documents currently visible in the index.
    async fn count(&self, index: &str) -> Result<u64, EngineError>;

    /// Create-only write. Fails with [`EngineError::Conflict`] if `id` is taken.
    /// The document must be visible to `count` and `search` once this returns.
    async fn create_document(&self, index: &str, id: &str, source: Value)
    -> Result<(), EngineError>;

    /// Returns the stored `_source` of a document, `None` if it does not exist.
    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, EngineError>;

    /// Runs a search request body and returns the `_source` of each hit in rank order.
    async fn search(&self, index: &str, body: Value) -> Result<Vec<Value>, EngineError>;
}
