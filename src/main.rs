use doc_search::config::SearchConfig;
use doc_search::engine::connection::EngineConnection;
use doc_search::service::handlers::{AppState, router};
use doc_search::store::document_store::DocumentStore;
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doc_search::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let mut config = SearchConfig::from_env()?;
    if let Some(bind) = doc_search::bind_override(&args)? {
        config.bind = bind;
    }

    tracing::info!("Starting search service on {}", config.bind);
    tracing::info!(
        "Index '{}', retry every {:?} (max attempts: {}), engine timeout {:?}",
        config.index_name,
        config.retry.interval,
        config.retry.max_attempts,
        config.engine_timeout
    );

    // 1. Engine connection (blocks until the engine answers or retries run out):
    let engine = config.engine.build()?;
    let connection =
        Arc::new(EngineConnection::connect(engine, config.retry.clone(), config.engine_timeout).await?);

    // 2. Index bootstrap + store:
    let store = Arc::new(DocumentStore::bootstrap(connection, config.index_name.clone()).await?);

    // 3. HTTP Router:
    let app = router(AppState {
        store,
        banner: format!("Document search service running on {}", config.bind),
    });

    // 4. Start HTTP server:
    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    tracing::info!("HTTP server listening on {}", listener.local_addr()?);
    tracing::info!("Press Ctrl+C to shutdown");

    axum::serve(listener, app)
        .with_graceful_shutdown(doc_search::shutdown_signal())
        .await?;

    Ok(())
}
