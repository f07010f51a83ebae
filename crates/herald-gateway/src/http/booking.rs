//! Booking lifecycle ingress: POST /events/booking.
//!
//! The booking backend reports each transition once; this handler fans it out
//! to live subscribers and, for new and ticketed bookings, to the Telegram
//! admin chats.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    Json,
};
use herald_core::types::Role;
use herald_protocol::{events, payloads::BookingEventPayload};
use herald_realtime::Event;
use herald_telegram::{AdminAlertReport, AlertKind, BookingAlert};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::app::AppState;
use crate::auth::require_trigger;
use crate::http::{api_error, ApiError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingEventKind {
    Created,
    Ticketed,
    StatusChanged,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingEventRequest {
    kind: BookingEventKind,
    #[serde(default, alias = "oldStatus")]
    previous_status: Option<String>,
    #[serde(default)]
    new_status: Option<String>,
    #[serde(default)]
    ticketed_by: Option<String>,
    #[serde(flatten)]
    booking: BookingAlert,
}

/// POST /events/booking
pub async fn booking_event_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, ApiError> {
    require_trigger(&state, &headers)?;

    let request: BookingEventRequest = serde_json::from_value(body.clone()).map_err(|e| {
        warn!(error = %e, "invalid booking event body");
        api_error(StatusCode::BAD_REQUEST, format!("invalid booking event: {e}"))
    })?;
    let reference = request.booking.booking_reference.trim().to_string();
    if reference.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "bookingReference is required"));
    }

    let booking = &request.booking;
    let (delivered, telegram) = match request.kind {
        BookingEventKind::Created => {
            let mut details = body;
            if let Some(obj) = details.as_object_mut() {
                obj.remove("kind");
            }
            let payload = BookingEventPayload::new(events::BOOKING_CREATED, &reference).with("booking", details);
            let delivered = state.registry.broadcast(&Event::new(events::BOOKING_CREATED, Role::Admin, payload));
            (delivered, alert_admins(&state, booking, AlertKind::NewBooking).await)
        }
        BookingEventKind::Ticketed => {
            let status = booking.status.clone().unwrap_or_else(|| "ticketed".to_string());
            let customer = BookingEventPayload::new(events::BOOKING_TICKETED, &reference)
                .with("status", &status)
                .with("eticketNumbers", &booking.eticket_numbers)
                .with("airlineRecordLocator", &booking.airline_record_locator);
            let admin = customer.clone().with("ticketedBy", &request.ticketed_by);

            let delivered = state.registry.broadcast(
                &Event::new(events::BOOKING_TICKETED, Role::Customer, customer).for_reference(&reference),
            ) + state
                .registry
                .broadcast(&Event::new(events::BOOKING_TICKETED, Role::Admin, admin));
            (delivered, alert_admins(&state, booking, AlertKind::TicketIssued).await)
        }
        BookingEventKind::StatusChanged => {
            let new_status = request.new_status.as_deref().or(booking.status.as_deref());
            let Some(new_status) = new_status.filter(|s| !s.is_empty()) else {
                return Err(api_error(StatusCode::BAD_REQUEST, "status is required for status_changed"));
            };
            let payload = BookingEventPayload::new(events::BOOKING_STATUS_CHANGED, &reference)
                .with("oldStatus", &request.previous_status)
                .with("newStatus", new_status);

            let delivered = state
                .registry
                .broadcast(&Event::new(events::BOOKING_STATUS_CHANGED, Role::Admin, payload.clone()))
                + state.registry.broadcast(
                    &Event::new(events::BOOKING_STATUS_CHANGED, Role::Customer, payload).for_reference(&reference),
                );
            (delivered, AdminAlertReport::default())
        }
    };

    info!(
        booking = %reference,
        kind = ?request.kind,
        delivered,
        telegram_sent = telegram.sent,
        telegram_failed = telegram.failed,
        "booking event published"
    );

    Ok(Json(json!({
        "delivered": delivered,
        "telegram": { "sent": telegram.sent, "failed": telegram.failed },
    })))
}

async fn alert_admins(state: &AppState, booking: &BookingAlert, kind: AlertKind) -> AdminAlertReport {
    let html = booking.render(kind, state.telegram.dashboard_url());
    state.telegram.notify_admins(&html).await
}
