//! In-process search engine.
//!
//! A DashMap-backed stand-in for the external engine. It understands the
//! subset of the query DSL the document store sends (`match` with
//! `fuzziness`, `match_all`, `size`) and honours the index schema: keyword
//! fields match whole values exactly, text fields are analyzed and matched
//! term by term with edit-distance tolerance.
//!
//! Used by the test suites and for local runs without an engine
//! (`SEARCH_ENGINE_URL=memory://`).

use super::tokenizer::{analyze, edit_distance, max_edits};
use super::types::{EngineError, FieldKind, IndexSchema, SearchEngine};

use async_trait::async_trait;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

const DEFAULT_SIZE: usize = 10;

struct MemoryIndex {
    schema: IndexSchema,
    documents: Arc<DashMap<String, Value>>,
}

pub struct MemoryEngine {
    indices: DashMap<String, MemoryIndex>,
    available: AtomicBool,
    write_delay: Option<Duration>,
}

impl MemoryEngine {
    pub fn new() -> Self {
        Self {
            indices: DashMap::new(),
            available: AtomicBool::new(true),
            write_delay: None,
        }
    }

    /// Delays every document write, widening the window between a count and
    /// the write that depends on it.
    pub fn with_write_delay(mut self, delay: Duration) -> Self {
        self.write_delay = Some(delay);
        self
    }

    /// Simulates the engine going away (or coming back).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    pub fn index_names(&self) -> Vec<String> {
        self.indices.iter().map(|entry| entry.key().clone()).collect()
    }

    fn check_available(&self) -> Result<(), EngineError> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(EngineError::Transport("connection refused".to_string()))
        }
    }

    fn documents(&self, index: &str) -> Result<Arc<DashMap<String, Value>>, EngineError> {
        self.indices
            .get(index)
            .map(|entry| entry.documents.clone())
            .ok_or_else(|| index_not_found(index))
    }

    fn schema(&self, index: &str) -> Result<IndexSchema, EngineError> {
        self.indices
            .get(index)
            .map(|entry| entry.schema.clone())
            .ok_or_else(|| index_not_found(index))
    }
}

impl Default for MemoryEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SearchEngine for MemoryEngine {
    async fn ping(&self) -> Result<(), EngineError> {
        self.check_available()
    }

    async fn index_exists(&self, index: &str) -> Result<bool, EngineError> {
        self.check_available()?;
        Ok(self.indices.contains_key(index))
    }

    async fn create_index(&self, index: &str, schema: &IndexSchema) -> Result<(), EngineError> {
        self.check_available()?;
        self.indices
            .entry(index.to_string())
            .or_insert_with(|| MemoryIndex {
                schema: schema.clone(),
                documents: Arc::new(DashMap::new()),
            });
        Ok(())
    }

    async fn count(&self, index: &str) -> Result<u64, EngineError> {
        self.check_available()?;
        Ok(self.documents(index)?.len() as u64)
    }

    async fn create_document(
        &self,
        index: &str,
        id: &str,
        source: Value,
    ) -> Result<(), EngineError> {
        self.check_available()?;
        if let Some(delay) = self.write_delay {
            tokio::time::sleep(delay).await;
        }

        let documents = self.documents(index)?;
        let result = match documents.entry(id.to_string()) {
            Entry::Occupied(_) => Err(EngineError::Conflict { id: id.to_string() }),
            Entry::Vacant(slot) => {
                slot.insert(source);
                Ok(())
            }
        };
        result
    }

    async fn get_document(&self, index: &str, id: &str) -> Result<Option<Value>, EngineError> {
        self.check_available()?;
        Ok(self
            .documents(index)?
            .get(id)
            .map(|entry| entry.value().clone()))
    }

    async fn search(&self, index: &str, body: Value) -> Result<Vec<Value>, EngineError> {
        self.check_available()?;
        let schema = self.schema(index)?;
        let documents = self.documents(index)?;

        let size = body
            .get("size")
            .and_then(Value::as_u64)
            .map(|s| s as usize)
            .unwrap_or(DEFAULT_SIZE);
        let query = parse_query(&body)?;

        let mut scored: Vec<(f64, usize, String, Value)> = documents
            .iter()
            .filter_map(|entry| {
                let score = query.score(&schema, entry.value());
                if score > 0.0 {
                    let length = entry
                        .value()
                        .get(query.field())
                        .and_then(Value::as_str)
                        .map(|text| analyze(text).len())
                        .unwrap_or(0);
                    Some((score, length, entry.key().clone(), entry.value().clone()))
                } else {
                    None
                }
            })
            .collect();

        // Highest score first; shorter fields and lower ids break ties.
        scored.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.1.cmp(&b.1))
                .then(a.2.cmp(&b.2))
        });

        Ok(scored
            .into_iter()
            .take(size)
            .map(|(_, _, _, source)| source)
            .collect())
    }
}

enum MemoryQuery {
    All,
    Match {
        field: String,
        text: String,
        fuzziness: Option<Value>,
    },
}

impl MemoryQuery {
    fn field(&self) -> &str {
        match self {
            MemoryQuery::All => "",
            MemoryQuery::Match { field, .. } => field,
        }
    }

    fn score(&self, schema: &IndexSchema, source: &Value) -> f64 {
        let (field, text, fuzziness) = match self {
            MemoryQuery::All => return 1.0,
            MemoryQuery::Match {
                field,
                text,
                fuzziness,
            } => (field, text, fuzziness),
        };

        let Some(value) = source.get(field).and_then(Value::as_str) else {
            return 0.0;
        };

        match schema.field_kind(field) {
            Some(FieldKind::Keyword) => {
                if value == text {
                    1.0
                } else {
                    0.0
                }
            }
            _ => {
                let doc_terms = analyze(value);
                analyze(text)
                    .iter()
                    .map(|term| {
                        let allowed = max_edits(fuzziness.as_ref(), term);
                        doc_terms
                            .iter()
                            .map(|candidate| edit_distance(term, candidate))
                            .filter(|distance| *distance <= allowed)
                            .min()
                            .map(|distance| 1.0 / (1.0 + distance as f64))
                            .unwrap_or(0.0)
                    })
                    .sum()
            }
        }
    }
}

fn parse_query(body: &Value) -> Result<MemoryQuery, EngineError> {
    let query = match body.get("query") {
        None => return Ok(MemoryQuery::All),
        Some(query) => query,
    };

    if query.get("match_all").is_some() {
        return Ok(MemoryQuery::All);
    }

    let clause = query
        .get("match")
        .and_then(Value::as_object)
        .and_then(|fields| fields.iter().next())
        .ok_or_else(|| EngineError::Status {
            status: 400,
            body: format!("unsupported query: {}", query),
        })?;

    let (field, value) = clause;
    let (text, fuzziness) = match value {
        Value::String(text) => (text.clone(), None),
        Value::Object(options) => {
            let text = options
                .get("query")
                .and_then(Value::as_str)
                .ok_or_else(|| EngineError::Status {
                    status: 400,
                    body: format!("match on '{}' is missing 'query'", field),
                })?;
            (text.to_string(), options.get("fuzziness").cloned())
        }
        other => {
            return Err(EngineError::Status {
                status: 400,
                body: format!("unsupported match value: {}", other),
            });
        }
    };

    Ok(MemoryQuery::Match {
        field: field.clone(),
        text,
        fuzziness,
    })
}

fn index_not_found(index: &str) -> EngineError {
    EngineError::Status {
        status: 404,
        body: format!("index_not_found_exception: no such index [{}]", index),
    }
}
