//! Search Service Module
//!
//! The HTTP face of the document store.
//!
//! ## Routes
//! - `GET /`: liveness / info message.
//! - `POST /insert`: form field `text`; stores a document.
//! - `GET /search?query=`: single best fuzzy match.
//! - `GET /health`: engine reachability and document count.
//!
//! Store outcomes and errors are converted into `ApiResponse` bodies here and
//! never escape as panics or transport failures.

pub mod handlers;
pub mod protocol;
