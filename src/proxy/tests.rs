//! Proxy Service Tests
//!
//! ## Test Scopes
//! - **Relay**: requests reach a live search service and its answers come back unchanged.
//! - **Failure handling**: an unreachable, silent or misbehaving backend yields a `Backend error` body.
//! - **Client page**: `GET /` serves the HTML client.

#[cfg(test)]
mod tests {
    use crate::config::ProxyConfig;
    use crate::engine::connection::{EngineConnection, RetryPolicy};
    use crate::engine::memory::MemoryEngine;
    use crate::proxy::handlers::{ProxyState, router};
    use crate::service::handlers::{AppState, router as service_router};
    use crate::service::protocol::{ApiResponse, MSG_BACKEND_ERROR, MSG_FOUND, MSG_NO_DATA, MSG_STORED};
    use crate::store::document_store::DocumentStore;
    use axum::Router;
    use axum::routing::{get, post};
    use reqwest::StatusCode;
    use std::sync::Arc;
    use std::time::Duration;

    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn spawn_backend() -> String {
        let connection = EngineConnection::connect(
            Arc::new(MemoryEngine::new()),
            RetryPolicy::fixed(1, Duration::from_millis(10)),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        let store = DocumentStore::bootstrap(Arc::new(connection), "documents")
            .await
            .unwrap();

        serve(service_router(AppState {
            store: Arc::new(store),
            banner: "Document search service running".to_string(),
        }))
        .await
    }

    /// An address nothing is listening on.
    async fn dead_backend() -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}", addr)
    }

    async fn spawn_proxy(backend_url: &str, legacy_status: bool) -> String {
        spawn_proxy_with_timeout(backend_url, legacy_status, Duration::from_secs(2)).await
    }

    async fn spawn_proxy_with_timeout(
        backend_url: &str,
        legacy_status: bool,
        backend_timeout: Duration,
    ) -> String {
        let config = ProxyConfig {
            bind: "127.0.0.1:0".parse().unwrap(),
            backend_url: backend_url.to_string(),
            backend_timeout,
            legacy_status,
        };
        serve(router(ProxyState::new(&config).unwrap())).await
    }

    async fn post_insert(proxy: &str, text: &str) -> (StatusCode, ApiResponse) {
        let resp = reqwest::Client::new()
            .post(format!("{}/insert", proxy))
            .form(&[("text", text)])
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn get_search(proxy: &str, query: &str) -> (StatusCode, ApiResponse) {
        let resp = reqwest::Client::new()
            .get(format!("{}/search", proxy))
            .query(&[("query", query)])
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    // ============================================================
    // RELAY TESTS
    // ============================================================

    #[tokio::test]
    async fn test_relays_insert_and_search() {
        let backend = spawn_backend().await;
        let proxy = spawn_proxy(&backend, false).await;

        let (status, body) = post_insert(&proxy, "hello from the proxy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, MSG_STORED);
        assert_eq!(body.id.as_deref(), Some("1"));

        let (status, body) = get_search(&proxy, "helo proxy").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.message, MSG_FOUND);
        assert_eq!(body.text.as_deref(), Some("hello from the proxy"));
    }

    #[tokio::test]
    async fn test_relays_no_data() {
        let backend = spawn_backend().await;
        let proxy = spawn_proxy(&backend, false).await;

        let (status, body) = get_search(&proxy, "nothing & everything?").await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, ApiResponse::message(MSG_NO_DATA));
    }

    #[tokio::test]
    async fn test_relays_backend_error_status() {
        let backend = spawn_backend().await;
        let proxy = spawn_proxy(&backend, false).await;

        let (status, body) = post_insert(&proxy, "").await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.error.is_some());
    }

    // ============================================================
    // FAILURE HANDLING TESTS
    // ============================================================

    #[tokio::test]
    async fn test_unreachable_backend_insert() {
        let proxy = spawn_proxy(&dead_backend().await, false).await;

        let (status, body) = post_insert(&proxy, "hello").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.message, MSG_BACKEND_ERROR);
        assert!(!body.error.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_backend_search() {
        let proxy = spawn_proxy(&dead_backend().await, false).await;

        let (status, body) = get_search(&proxy, "hello").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.message, MSG_BACKEND_ERROR);
        assert!(!body.error.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_legacy_status_answers_ok() {
        let proxy = spawn_proxy(&dead_backend().await, true).await;

        let (insert_status, insert_body) = post_insert(&proxy, "hello").await;
        let (search_status, search_body) = get_search(&proxy, "hello").await;

        assert_eq!(insert_status, StatusCode::OK);
        assert_eq!(search_status, StatusCode::OK);
        assert_eq!(insert_body.message, MSG_BACKEND_ERROR);
        assert_eq!(search_body.message, MSG_BACKEND_ERROR);
    }

    #[tokio::test]
    async fn test_non_json_backend_body() {
        let backend = serve(Router::new().route("/search", get(|| async { "plain text" }))).await;
        let proxy = spawn_proxy(&backend, false).await;

        let (status, body) = get_search(&proxy, "hello").await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.message, MSG_BACKEND_ERROR);
        assert!(body.error.unwrap_or_default().contains("invalid backend response"));
    }

    #[tokio::test]
    async fn test_silent_backend_times_out() {
        let silent = || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "too late"
        };
        let backend = serve(
            Router::new()
                .route("/search", get(silent))
                .route("/insert", post(silent)),
        )
        .await;
        let proxy = spawn_proxy_with_timeout(&backend, false, Duration::from_millis(200)).await;

        let started = std::time::Instant::now();
        let (search_status, search_body) = get_search(&proxy, "hello").await;
        let (insert_status, insert_body) = post_insert(&proxy, "hello").await;

        assert!(started.elapsed() < Duration::from_secs(4));
        assert_eq!(search_status, StatusCode::BAD_GATEWAY);
        assert_eq!(insert_status, StatusCode::BAD_GATEWAY);
        assert_eq!(search_body.message, MSG_BACKEND_ERROR);
        assert_eq!(insert_body.message, MSG_BACKEND_ERROR);
        assert!(!search_body.error.unwrap_or_default().is_empty());
    }

    // ============================================================
    // CLIENT PAGE TESTS
    // ============================================================

    #[tokio::test]
    async fn test_root_serves_client_page() {
        let proxy = spawn_proxy(&dead_backend().await, false).await;

        let resp = reqwest::get(format!("{}/", proxy)).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(resp
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .starts_with("text/html"));

        let page = resp.text().await.unwrap();
        assert!(page.contains("insertText()"));
        assert!(page.contains("getBest()"));
    }
}
