//! Shared-secret check for trigger endpoints (cron jobs, booking backend).
//!
//! The secret may arrive as `Authorization: Bearer <secret>` or as
//! `x-cron-secret: <secret>`. With no `auth.trigger_secret` configured every
//! trigger is refused.

use axum::http::HeaderMap;

use crate::app::AppState;
use crate::http::{api_error, ApiError};

pub fn check_trigger_auth(state: &AppState, headers: &HeaderMap) -> bool {
    let expected = match state.config.auth.trigger_secret.as_deref() {
        Some(s) if !s.is_empty() => s,
        // No secret configured: deny.
        _ => return false,
    };
    extract_bearer(headers)
        .or_else(|| header_str(headers, "x-cron-secret"))
        .map(|t| t == expected)
        .unwrap_or(false)
}

/// Handler guard: `Err(401)` unless [`check_trigger_auth`] passes.
pub fn require_trigger(state: &AppState, headers: &HeaderMap) -> Result<(), ApiError> {
    if check_trigger_auth(state, headers) {
        Ok(())
    } else {
        tracing::warn!("trigger request rejected: missing or invalid secret");
        Err(api_error(axum::http::StatusCode::UNAUTHORIZED, "Unauthorized"))
    }
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    header_str(headers, "authorization").and_then(|v| v.strip_prefix("Bearer "))
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
