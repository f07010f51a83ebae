use herald_core::types::{now_timestamp, Role};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{events, frames::SseFrame};

/// First frame on every stream. Wire: `{"clientId":"…","type":"admin","timestamp":"…"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectedPayload {
    pub client_id: String,
    #[serde(rename = "type")]
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking_reference: Option<String>,
    pub timestamp: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatPayload {
    pub timestamp: String,
}

/// Body of every `booking_*` event. Producer-specific fields ride in `details`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingEventPayload {
    #[serde(rename = "type")]
    pub kind: String,
    pub booking_reference: String,
    pub timestamp: String,
    #[serde(flatten)]
    pub details: serde_json::Map<String, Value>,
}

impl BookingEventPayload {
    pub fn new(kind: &str, booking_reference: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            booking_reference: booking_reference.into(),
            timestamp: now_timestamp(),
            details: serde_json::Map::new(),
        }
    }

    /// Attach a detail field; `null` values are skipped.
    pub fn with(mut self, key: &str, value: impl Serialize) -> Self {
        match serde_json::to_value(value) {
            Ok(Value::Null) | Err(_) => {}
            Ok(v) => {
                self.details.insert(key.to_string(), v);
            }
        }
        self
    }
}

pub fn connected_frame(client_id: &str, role: Role, booking_reference: Option<&str>) -> SseFrame {
    SseFrame::new(
        events::CONNECTED,
        ConnectedPayload {
            client_id: client_id.to_string(),
            role,
            booking_reference: booking_reference.map(str::to_string),
            timestamp: now_timestamp(),
        },
    )
}

pub fn heartbeat_frame() -> SseFrame {
    SseFrame::new(
        events::HEARTBEAT,
        HeartbeatPayload {
            timestamp: now_timestamp(),
        },
    )
}
