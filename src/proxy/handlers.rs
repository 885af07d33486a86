use crate::config::ProxyConfig;
use crate::service::protocol::{
    ApiResponse, ENDPOINT_INSERT, ENDPOINT_ROOT, ENDPOINT_SEARCH, InsertForm, MSG_BACKEND_ERROR,
    SearchParams,
};

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value;

#[derive(Clone)]
pub struct ProxyState {
    backend_url: String,
    client: reqwest::Client,
    legacy_status: bool,
}

impl ProxyState {
    pub fn new(config: &ProxyConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(config.backend_timeout)
            .build()?;

        Ok(Self {
            backend_url: config.backend_url.clone(),
            client,
            legacy_status: config.legacy_status,
        })
    }

    pub fn backend_url(&self) -> &str {
        &self.backend_url
    }

    fn failure_status(&self) -> StatusCode {
        if self.legacy_status {
            StatusCode::OK
        } else {
            StatusCode::BAD_GATEWAY
        }
    }
}

pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route(ENDPOINT_ROOT, get(ui))
        .route(ENDPOINT_INSERT, post(proxy_insert))
        .route(ENDPOINT_SEARCH, get(proxy_search))
        .with_state(state)
}

async fn ui() -> Html<&'static str> {
    Html(include_str!("ui.html"))
}

pub async fn proxy_insert(
    State(state): State<ProxyState>,
    Form(form): Form<InsertForm>,
) -> (StatusCode, Json<Value>) {
    let url = format!("{}{}", state.backend_url, ENDPOINT_INSERT);
    let request = state.client.post(url).form(&form);
    relay(&state, request).await
}

pub async fn proxy_search(
    State(state): State<ProxyState>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<Value>) {
    let url = format!(
        "{}{}?query={}",
        state.backend_url,
        ENDPOINT_SEARCH,
        urlencoding::encode(&params.query)
    );
    let request = state.client.get(url);
    relay(&state, request).await
}

/// Sends the request and hands back the backend's status and JSON body.
///
/// Transport failures and non-JSON bodies become a `Backend error` body; they
/// never propagate past the proxy.
async fn relay(state: &ProxyState, request: reqwest::RequestBuilder) -> (StatusCode, Json<Value>) {
    let response = match request.send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!("Backend request failed: {}", e);
            return backend_error(state, e.to_string());
        }
    };

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    match response.json::<Value>().await {
        Ok(body) => {
            tracing::debug!("Backend answered {}", status);
            (status, Json(body))
        }
        Err(e) => {
            tracing::error!("Backend returned an unreadable body ({}): {}", status, e);
            backend_error(state, format!("invalid backend response ({}): {}", status, e))
        }
    }
}

fn backend_error(state: &ProxyState, error: String) -> (StatusCode, Json<Value>) {
    let body = ApiResponse::error(MSG_BACKEND_ERROR, error);
    (
        state.failure_status(),
        Json(serde_json::to_value(body).unwrap_or_default()),
    )
}
