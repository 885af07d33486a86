//! Document Store Module
//!
//! Append-only storage of text documents on top of the engine connection.
//!
//! ## Operations
//! - **insert**: assigns the next id, writes, and verifies by reading back.
//! - **search**: single best-match fuzzy lookup on the document text.

pub mod document_store;
pub mod types;
