//! Document Store
//!
//! Inserts and fuzzy searches against a single named index. This is the only
//! place that knows how document ids are assigned and what a search request
//! looks like.
//!
//! ## Id assignment
//! `id = count + 1`, computed from the number of documents in the index just
//! before the write. The count, the write and the read-back run under one
//! lock, so inserts handled by this process never compute the same id. The
//! write itself is create-only: if another writer (say, a second process on
//! the same index) already took the id, the insert is reported as failed
//! instead of silently replacing that document.

use super::types::{Document, InsertResult, SearchResult, StoreError};
use crate::engine::connection::EngineConnection;
use crate::engine::types::{EngineError, IndexSchema};

use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::Mutex;

pub struct DocumentStore {
    connection: Arc<EngineConnection>,
    index: String,
    insert_lock: Mutex<()>,
}

impl DocumentStore {
    pub fn new(connection: Arc<EngineConnection>, index: impl Into<String>) -> Self {
        Self {
            connection,
            index: index.into(),
            insert_lock: Mutex::new(()),
        }
    }

    /// Ensures the index exists with the document schema, then opens the store.
    pub async fn bootstrap(
        connection: Arc<EngineConnection>,
        index: impl Into<String>,
    ) -> Result<Self, EngineError> {
        let index = index.into();
        connection
            .ensure_index(&index, &IndexSchema::documents())
            .await?;
        Ok(Self::new(connection, index))
    }

    pub fn index_name(&self) -> &str {
        &self.index
    }

    pub fn connection(&self) -> &Arc<EngineConnection> {
        &self.connection
    }

    pub async fn count(&self) -> Result<u64, StoreError> {
        Ok(self.connection.count(&self.index).await?)
    }

    /// Stores `text` under the next id and verifies it by reading it back.
    ///
    /// # Returns
    /// * `Ok(InsertResult::Stored)` once the document has been read back.
    /// * `Ok(InsertResult::Failed)` if the id was taken or the read-back was
    ///   missing or malformed.
    /// * `Err(StoreError)` for empty text or engine failures.
    pub async fn insert(&self, text: &str) -> Result<InsertResult, StoreError> {
        if text.is_empty() {
            return Err(StoreError::EmptyText);
        }

        let _guard = self.insert_lock.lock().await;

        let count = self.connection.count(&self.index).await?;
        let id = (count + 1).to_string();
        let document = Document {
            id: id.clone(),
            text: text.to_string(),
        };

        let source = serde_json::to_value(&document)
            .map_err(|e| EngineError::InvalidResponse(e.to_string()))?;

        match self
            .connection
            .create_document(&self.index, &id, source)
            .await
        {
            Ok(()) => {}
            Err(EngineError::Conflict { id }) => {
                tracing::warn!("Document id {} already taken in {}", id, self.index);
                return Ok(InsertResult::Failed {
                    id,
                    reason: "document id already taken".to_string(),
                });
            }
            Err(e) => return Err(e.into()),
        }

        let stored = self.connection.get_document(&self.index, &id).await?;
        match stored.map(serde_json::from_value::<Document>) {
            Some(Ok(stored)) => {
                tracing::debug!("Stored document {} in {}", stored.id, self.index);
                Ok(InsertResult::Stored(stored))
            }
            Some(Err(e)) => {
                tracing::warn!("Document {} read back malformed: {}", id, e);
                Ok(InsertResult::Failed {
                    id,
                    reason: format!("malformed read-back: {}", e),
                })
            }
            None => {
                tracing::warn!("Document {} missing after write", id);
                Ok(InsertResult::Failed {
                    id,
                    reason: "document missing after write".to_string(),
                })
            }
        }
    }

    /// Returns the single most relevant document for `query`.
    ///
    /// Matches against the analyzed `text` field with automatic fuzziness, so
    /// small spelling differences (scaled to term length) still match.
    pub async fn search(&self, query: &str) -> Result<SearchResult, StoreError> {
        let hits = self
            .connection
            .search(&self.index, best_match_request(query))
            .await?;

        let Some(best) = hits.into_iter().next() else {
            return Ok(SearchResult::NoResults);
        };

        Ok(SearchResult::Found(Document {
            id: source_str(&best, "id").unwrap_or("unknown").to_string(),
            text: source_str(&best, "text")
                .unwrap_or("No text available")
                .to_string(),
        }))
    }
}

/// Single best hit on `text`, typo tolerant.
pub fn best_match_request(query: &str) -> Value {
    json!({
        "query": {
            "match": {
                "text": {
                    "query": query,
                    "fuzziness": "AUTO"
                }
            }
        },
        "size": 1,
        "sort": ["_score"]
    })
}

fn source_str<'a>(source: &'a Value, field: &str) -> Option<&'a str> {
    source.get(field).and_then(Value::as_str)
}
