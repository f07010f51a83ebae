use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /health: liveness check with subscriber, queue and platform summaries.
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let queue = match state.worker.store().counts() {
        Ok(counts) => json!(counts),
        Err(e) => {
            tracing::warn!(error = %e, "health: queue counts unavailable");
            Value::Null
        }
    };

    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("HERALD_GIT_SHA"),
        "subscribers": state.registry.stats(),
        "queue": queue,
        "platforms": state.worker.platforms().statuses(),
        "workerEnabled": state.config.distribution.worker_enabled,
    }))
}
