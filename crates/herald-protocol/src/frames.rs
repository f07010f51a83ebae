use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One Server-Sent Events message.
///
/// Wire:
/// ```text
/// id: evt_0192…
/// event: booking_created
/// data: {"bookingReference":"FLY2A-X1"}
///
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SseFrame {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub event: String,
    pub data: Value,
}

impl SseFrame {
    /// Build a frame with a fresh, time-sortable event id.
    pub fn new(event: impl Into<String>, payload: impl Serialize) -> Self {
        Self {
            id: Some(next_event_id()),
            event: event.into(),
            data: serde_json::to_value(payload).unwrap_or(Value::Null),
        }
    }

    pub fn without_id(mut self) -> Self {
        self.id = None;
        self
    }

    /// Encode to the `text/event-stream` wire format, blank-line terminated.
    ///
    /// Multi-line data is split across several `data:` lines, which the
    /// EventSource parser joins back with `\n`.
    pub fn encode(&self) -> String {
        let data = serde_json::to_string(&self.data).unwrap_or_else(|_| "null".to_string());
        let mut out = String::with_capacity(data.len() + self.event.len() + 48);
        if let Some(ref id) = self.id {
            out.push_str("id: ");
            out.push_str(id);
            out.push('\n');
        }
        out.push_str("event: ");
        out.push_str(&self.event);
        out.push('\n');
        for line in data.split('\n') {
            out.push_str("data: ");
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
        out
    }

    /// Parse one encoded block (without the trailing blank line requirement).
    ///
    /// Comment lines (`:`) and unknown fields are ignored. Returns `None` when
    /// the block has no `data:` line or the data is not JSON.
    pub fn decode(block: &str) -> Option<Self> {
        let mut id = None;
        let mut event = "message".to_string();
        let mut data_lines: Vec<&str> = Vec::new();

        for line in block.lines() {
            if line.is_empty() || line.starts_with(':') {
                continue;
            }
            let (field, value) = match line.split_once(':') {
                Some((f, v)) => (f, v.strip_prefix(' ').unwrap_or(v)),
                None => (line, ""),
            };
            match field {
                "id" => id = Some(value.to_string()),
                "event" => event = value.to_string(),
                "data" => data_lines.push(value),
                _ => {}
            }
        }

        if data_lines.is_empty() {
            return None;
        }
        let data = serde_json::from_str(&data_lines.join("\n")).ok()?;
        Some(Self { id, event, data })
    }
}

/// Split a raw stream body into encoded blocks and decode each one.
pub fn decode_stream(body: &str) -> Vec<SseFrame> {
    body.split("\n\n").filter_map(SseFrame::decode).collect()
}

/// `evt_<uuidv7>`, sortable by creation time, unique across restarts.
pub fn next_event_id() -> String {
    format!("evt_{}", uuid::Uuid::now_v7().simple())
}
