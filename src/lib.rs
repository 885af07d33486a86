//! Document Indexing and Search Pipeline
//!
//! This library crate holds everything behind the two binaries: the search
//! service (`src/main.rs`) and the proxy (`proxy/`).
//!
//! ## Architecture Modules
//! Leaf-first:
//!
//! - **`engine`**: The connection to the full-text engine. A `SearchEngine` seam with an
//!   Elasticsearch implementation and an in-process one, wrapped by `EngineConnection`
//!   which owns retry (connection establishment, index bootstrap) and per-call timeouts.
//! - **`store`**: `DocumentStore`, append-only inserts with store-assigned ids and
//!   single best-match fuzzy search against one named index.
//! - **`service`**: The search service's HTTP routes on top of the store.
//! - **`proxy`**: The stateless proxy's HTTP routes, forwarding to the search service.
//! - **`config`**: Environment-driven configuration for both binaries.

pub mod config;
pub mod engine;
pub mod proxy;
pub mod service;
pub mod store;

/// Installs the global `tracing` subscriber. `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Resolves when the process receives Ctrl+C.
pub async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

/// Reads `--bind <addr:port>` from the command line, if given.
pub fn bind_override(args: &[String]) -> anyhow::Result<Option<std::net::SocketAddr>> {
    let mut bind = None;
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--bind" => {
                let value = args
                    .get(i + 1)
                    .ok_or_else(|| anyhow::anyhow!("--bind requires <addr:port>"))?;
                bind = Some(value.parse()?);
                i += 2;
            }
            _ => {
                i += 1;
            }
        }
    }
    Ok(bind)
}
