//! Proxy Service Module
//!
//! A stateless front door for the search service. It serves a small client
//! page and forwards `/insert` and `/search` over HTTP, relaying the backend's
//! status and body. When the backend cannot be reached, or answers with
//! something that is not JSON, the caller gets
//! `{"message": "Backend error", "error": "..."}` instead of a transport failure.

pub mod handlers;

#[cfg(test)]
mod tests;
