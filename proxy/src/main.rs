use doc_search::config::ProxyConfig;
use doc_search::proxy::handlers::{ProxyState, router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    doc_search::init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let mut config = ProxyConfig::from_env()?;
    if let Some(bind) = doc_search::bind_override(&args)? {
        config.bind = bind;
    }

    let state = ProxyState::new(&config)?;
    let app = router(state);

    tracing::info!("Forwarding to search service at {}", config.backend_url);
    tracing::info!("Proxy listening on {}", config.bind);

    axum::serve(tokio::net::TcpListener::bind(config.bind).await?, app)
        .with_graceful_shutdown(doc_search::shutdown_signal())
        .await?;

    Ok(())
}
