use herald_core::types::Role;
use herald_protocol::SseFrame;
use serde::Serialize;
use serde_json::Value;

/// A typed event addressed to one audience.
///
/// Immutable once built; the broadcaster encodes it once and hands the same
/// frame to every matching subscriber.
#[derive(Debug, Clone)]
pub struct Event {
    pub kind: String,
    pub payload: Value,
    pub target_role: Role,
    /// When set, only subscribers following this booking (or following no
    /// booking at all) receive the event.
    pub target_reference: Option<String>,
}

impl Event {
    pub fn new(kind: impl Into<String>, target_role: Role, payload: impl Serialize) -> Self {
        Self {
            kind: kind.into(),
            payload: serde_json::to_value(payload).unwrap_or(Value::Null),
            target_role,
            target_reference: None,
        }
    }

    pub fn for_reference(mut self, reference: impl Into<String>) -> Self {
        self.target_reference = Some(reference.into());
        self
    }

    /// Match rule: roles must be equal; a target reference must equal the
    /// subscriber's filter unless the subscriber has none.
    pub fn matches(&self, role: Role, filter_reference: Option<&str>) -> bool {
        if role != self.target_role {
            return false;
        }
        match (self.target_reference.as_deref(), filter_reference) {
            (Some(target), Some(filter)) => target == filter,
            _ => true,
        }
    }

    pub fn to_frame(&self) -> SseFrame {
        SseFrame::new(self.kind.clone(), &self.payload)
    }
}
