//! `herald-protocol`: Server-Sent Events wire format for the live booking
//! stream: frame encoding, event names and the typed control payloads.

pub mod events;
pub mod frames;
pub mod payloads;

pub use frames::SseFrame;
