//! Live event stream: GET /events?type=admin|customer[&booking=<ref>].

use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::Response,
};
use futures_util::StreamExt;
use herald_core::types::Role;
use herald_protocol::events::CONTENT_TYPE;
use serde::Deserialize;

use crate::app::AppState;
use crate::http::{api_error, ApiError};

#[derive(Debug, Deserialize)]
pub struct SubscribeParams {
    #[serde(rename = "type")]
    pub role: Option<String>,
    pub booking: Option<String>,
}

/// Register the caller and stream its frames until either side hangs up.
///
/// The `connected` frame is already queued when the response starts. The
/// subscriber is unregistered when the body stream is dropped.
pub async fn subscribe_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SubscribeParams>,
) -> Result<Response, ApiError> {
    let role: Role = params
        .role
        .as_deref()
        .unwrap_or_default()
        .parse()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?;
    let booking = params
        .booking
        .map(|b| b.trim().to_string())
        .filter(|b| !b.is_empty());

    let client_id = format!("{role}_{}", uuid::Uuid::new_v4().simple());
    let stream = state.registry.register(client_id, role, booking);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, CONTENT_TYPE)
        .header(header::CACHE_CONTROL, "no-cache")
        .header("x-accel-buffering", "no")
        .body(Body::from_stream(stream.map(Ok::<_, Infallible>)))
        .map_err(|e| api_error(StatusCode::INTERNAL_SERVER_ERROR, e))
}
