//! Search Engine Module
//!
//! Everything that talks to the full-text engine lives here.
//!
//! ## Submodules
//! - **`types`**: The `SearchEngine` seam, the index schema and `EngineError`.
//! - **`connection`**: `EngineConnection`, the process-wide handle with retry
//!   and per-call timeout policies.
//! - **`elastic`**: The Elasticsearch implementation of the seam.
//! - **`memory`**: An in-process implementation used by tests and local runs.
//! - **`tokenizer`**: Text analysis and edit distance for the in-process engine.

pub mod connection;
pub mod elastic;
pub mod memory;
pub mod tokenizer;
pub mod types;
