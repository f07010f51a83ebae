use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use herald_core::config::HeraldConfig;
use herald_distribution::DistributionWorker;
use herald_realtime::ConnectionRegistry;
use herald_telegram::TelegramPlatform;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::warn;

/// Central shared state, passed as `Arc<AppState>` to all Axum handlers.
pub struct AppState {
    pub config: HeraldConfig,
    /// Live SSE subscribers.
    pub registry: ConnectionRegistry,
    /// Queue access and on-demand batches; the same worker drives the
    /// background loop when enabled.
    pub worker: Arc<DistributionWorker>,
    /// Admin alerts. Also registered in the worker's platform set for
    /// channel posts.
    pub telegram: Arc<TelegramPlatform>,
}

impl AppState {
    pub fn new(
        config: HeraldConfig,
        registry: ConnectionRegistry,
        worker: Arc<DistributionWorker>,
        telegram: Arc<TelegramPlatform>,
    ) -> Self {
        Self {
            config,
            registry,
            worker,
            telegram,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.gateway.cors_origins);
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/events", get(crate::http::events::subscribe_handler))
        .route("/events/booking", post(crate::http::booking::booking_event_handler))
        .route("/distribution/enqueue", post(crate::http::distribution::enqueue_handler))
        .route("/distribution/process", post(crate::http::distribution::process_handler))
        .route("/distribution/retry", post(crate::http::distribution::retry_handler))
        .route("/distribution/queue", get(crate::http::distribution::list_handler))
        .route("/distribution/queue/{id}", get(crate::http::distribution::get_handler))
        .with_state(state)
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// An empty list or `*` allows any origin; otherwise only the listed ones.
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
