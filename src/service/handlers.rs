use super::protocol::*;
use crate::store::document_store::DocumentStore;
use crate::store::types::{InsertResult, SearchResult, StoreError};

use axum::extract::{Form, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<DocumentStore>,
    /// Shown by `GET /`.
    pub banner: String,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(ENDPOINT_ROOT, get(handle_root))
        .route(ENDPOINT_INSERT, post(handle_insert))
        .route(ENDPOINT_SEARCH, get(handle_search))
        .route(ENDPOINT_HEALTH, get(handle_health))
        .with_state(state)
}

pub async fn handle_root(State(state): State<AppState>) -> Json<ApiResponse> {
    Json(ApiResponse::message(state.banner.clone()))
}

pub async fn handle_insert(
    State(state): State<AppState>,
    Form(form): Form<InsertForm>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.store.insert(&form.text).await {
        Ok(InsertResult::Stored(doc)) => {
            tracing::info!("Stored document {}", doc.id);
            (
                StatusCode::OK,
                Json(ApiResponse::document(MSG_STORED, doc.id, doc.text)),
            )
        }
        Ok(InsertResult::Failed { id, reason }) => {
            tracing::warn!("Insert of document {} failed: {}", id, reason);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::message(MSG_STORE_FAILED)),
            )
        }
        Err(StoreError::EmptyText) => (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::error(
                MSG_STORE_FAILED,
                StoreError::EmptyText.to_string(),
            )),
        ),
        Err(e) => {
            tracing::error!("Insert failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(MSG_STORE_FAILED, e.to_string())),
            )
        }
    }
}

pub async fn handle_search(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> (StatusCode, Json<ApiResponse>) {
    match state.store.search(&params.query).await {
        Ok(SearchResult::Found(doc)) => (
            StatusCode::OK,
            Json(ApiResponse::document(MSG_FOUND, doc.id, doc.text)),
        ),
        Ok(SearchResult::NoResults) => (StatusCode::OK, Json(ApiResponse::message(MSG_NO_DATA))),
        Err(e) => {
            tracing::error!("Search for '{}' failed: {}", params.query, e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(MSG_ENGINE_UNAVAILABLE, e.to_string())),
            )
        }
    }
}

pub async fn handle_health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let index = state.store.index_name().to_string();

    match state.store.count().await {
        Ok(documents) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                index,
                documents: Some(documents),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::warn!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthResponse {
                    status: "unavailable".to_string(),
                    index,
                    documents: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
