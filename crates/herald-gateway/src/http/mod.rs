pub mod booking;
pub mod distribution;
pub mod events;
pub mod health;

use axum::{http::StatusCode, Json};
use herald_distribution::QueueError;
use serde_json::{json, Value};

/// Error half of every handler result: status plus `{"error": "..."}`.
pub type ApiError = (StatusCode, Json<Value>);

pub fn api_error(status: StatusCode, message: impl std::fmt::Display) -> ApiError {
    (status, Json(json!({ "error": message.to_string() })))
}

/// Map queue errors onto HTTP statuses. Storage failures are logged and
/// reported as a bare 500.
pub fn queue_error(e: QueueError) -> ApiError {
    match e {
        QueueError::ItemNotFound { .. } => api_error(StatusCode::NOT_FOUND, e),
        QueueError::InvalidItem(_) => api_error(StatusCode::BAD_REQUEST, e),
        QueueError::InvalidTransition { .. } => api_error(StatusCode::CONFLICT, e),
        QueueError::Database(_) | QueueError::Serialization(_) => {
            tracing::error!(error = %e, "distribution queue error");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "internal error")
        }
    }
}
