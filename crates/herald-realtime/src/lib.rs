//! `herald-realtime`: live event fan-out to Server-Sent Events subscribers.
//!
//! # Overview
//!
//! A [`ConnectionRegistry`] owns every open subscriber connection of the
//! process. Each subscriber gets a bounded buffer; the HTTP layer drains it
//! into the response body through a [`SubscriberStream`]. Broadcasting is a
//! non-blocking loop over the registry: a subscriber whose buffer is closed
//! or full is dropped on the spot.
//!
//! A single [`HeartbeatSweeper`] task writes a `heartbeat` frame to every
//! subscriber on a fixed cadence, pruning connections that died without the
//! client signalling a disconnect.
//!
//! The registry is process-local; events are not shared between instances.

pub mod event;
pub mod heartbeat;
pub mod registry;

pub use event::Event;
pub use heartbeat::HeartbeatSweeper;
pub use registry::{ConnectionRegistry, RegistryStats, SubscriberInfo, SubscriberStream};
