// Event names on the live stream. Dashboards and chat widgets switch on these.

pub const CONNECTED: &str = "connected";
pub const HEARTBEAT: &str = "heartbeat";

// booking lifecycle
pub const BOOKING_CREATED: &str = "booking_created";
pub const BOOKING_TICKETED: &str = "booking_ticketed";
pub const BOOKING_STATUS_CHANGED: &str = "booking_status_changed";

/// Response content type for the event stream.
pub const CONTENT_TYPE: &str = "text/event-stream";
