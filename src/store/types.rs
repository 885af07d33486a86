//! Document Store Types

use crate::engine::types::EngineError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A stored document. `id` is assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub text: String,
}

/// Outcome of an insert that reached the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertResult {
    /// The write was verified by reading it back.
    Stored(Document),
    /// The write was rejected or could not be verified. The document may or
    /// may not be in the index; nothing is rolled back.
    Failed { id: String, reason: String },
}

/// Outcome of a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchResult {
    /// The single best-scoring document.
    Found(Document),
    NoResults,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("text must not be empty")]
    EmptyText,

    #[error(transparent)]
    Engine(#[from] EngineError),
}
