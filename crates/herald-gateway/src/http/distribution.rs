//! Distribution queue triggers and audit views.
//!
//! All routes here require the trigger secret; they are driven by cron jobs
//! and the marketing back office, never by browsers.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use herald_distribution::{BatchReport, NewPost, QueueItem, QueueStatus};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::app::AppState;
use crate::auth::require_trigger;
use crate::http::{api_error, queue_error, ApiError};

const DEFAULT_LIST_LIMIT: usize = 50;
const MAX_LIST_LIMIT: usize = 500;

/// POST /distribution/enqueue
pub async fn enqueue_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    require_trigger(&state, &headers)?;

    let post: NewPost = serde_json::from_value(body).map_err(|e| {
        warn!(error = %e, "invalid enqueue body");
        api_error(StatusCode::BAD_REQUEST, format!("invalid post: {e}"))
    })?;
    let item = state.worker.enqueue(post).map_err(queue_error)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "id": item.id,
            "status": item.status,
            "scheduledAt": item.scheduled_at,
        })),
    ))
}

#[derive(Debug, Default, Deserialize)]
pub struct ProcessParams {
    pub limit: Option<usize>,
}

/// POST /distribution/process[?limit=N]: run one batch now and report it.
pub async fn process_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ProcessParams>,
) -> Result<Json<BatchReport>, ApiError> {
    require_trigger(&state, &headers)?;
    let report = state.worker.process_batch(params.limit).await.map_err(queue_error)?;
    Ok(Json(report))
}

#[derive(Debug, Default, Deserialize)]
struct RetryRequest {
    #[serde(default)]
    ids: Option<Vec<String>>,
}

/// POST /distribution/retry: reset `failed` items to `pending`.
///
/// Without a body (or without `ids`) every failed item is reset.
pub async fn retry_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, ApiError> {
    require_trigger(&state, &headers)?;

    let request: RetryRequest = if body.iter().all(u8::is_ascii_whitespace) {
        RetryRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, format!("invalid retry body: {e}")))?
    };

    let reset = state
        .worker
        .store()
        .retry_failed(request.ids.as_deref())
        .map_err(queue_error)?;
    Ok(Json(json!({ "reset": reset })))
}

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub status: Option<String>,
    pub limit: Option<usize>,
}

/// GET /distribution/queue[?status=&limit=]: newest first, plus per-status
/// counts.
pub async fn list_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<ListParams>,
) -> Result<Json<Value>, ApiError> {
    require_trigger(&state, &headers)?;

    let status = params
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::parse::<QueueStatus>)
        .transpose()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let limit = params.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);

    let store = state.worker.store();
    let items = store.list(status, limit).map_err(queue_error)?;
    let counts = store.counts().map_err(queue_error)?;
    Ok(Json(json!({ "items": items, "counts": counts })))
}

/// GET /distribution/queue/{id}
pub async fn get_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<QueueItem>, ApiError> {
    require_trigger(&state, &headers)?;
    let item = state.worker.store().get(&id).map_err(queue_error)?;
    Ok(Json(item))
}
