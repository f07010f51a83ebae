use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

use dashmap::DashMap;
use futures_util::Stream;
use herald_core::types::{now_timestamp, Role};
use herald_protocol::payloads::{connected_frame, heartbeat_frame};
use serde::Serialize;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::event::Event;

/// One open subscriber connection.
struct Subscriber {
    role: Role,
    filter_reference: Option<String>,
    connected_at: String,
    /// Distinguishes successive connections that reuse a client id.
    token: u64,
    tx: mpsc::Sender<String>,
}

/// Read-only view of a subscriber, for diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberInfo {
    pub client_id: String,
    pub role: Role,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_reference: Option<String>,
    pub connected_at: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RegistryStats {
    pub admin: usize,
    pub customer: usize,
    pub total: usize,
}

/// Registry of live subscriber connections keyed by client id.
///
/// Cloning is cheap and every clone shares the same map, so the registry can
/// sit in `AppState` while each [`SubscriberStream`] keeps a handle for its
/// own cleanup.
#[derive(Clone)]
pub struct ConnectionRegistry {
    clients: Arc<DashMap<String, Subscriber>>,
    next_token: Arc<AtomicU64>,
    buffer: usize,
}

impl ConnectionRegistry {
    /// `buffer` is the number of frames a subscriber may lag behind before it
    /// is treated as dead.
    pub fn new(buffer: usize) -> Self {
        Self {
            clients: Arc::new(DashMap::new()),
            next_token: Arc::new(AtomicU64::new(1)),
            buffer: buffer.max(1),
        }
    }

    /// Add a subscriber and return the stream its frames arrive on.
    ///
    /// The `connected` frame is queued before the subscriber becomes visible
    /// to broadcasts, so it is always the first frame on the stream. A
    /// previous connection with the same id is replaced and its stream ends.
    pub fn register(
        &self,
        client_id: impl Into<String>,
        role: Role,
        filter_reference: Option<String>,
    ) -> SubscriberStream {
        let client_id = client_id.into();
        let (tx, rx) = mpsc::channel(self.buffer);
        let token = self.next_token.fetch_add(1, Ordering::Relaxed);

        let hello = connected_frame(&client_id, role, filter_reference.as_deref()).encode();
        // Fresh channel with capacity >= 1: cannot fail.
        let _ = tx.try_send(hello);

        let replaced = self
            .clients
            .insert(
                client_id.clone(),
                Subscriber {
                    role,
                    filter_reference: filter_reference.clone(),
                    connected_at: now_timestamp(),
                    token,
                    tx,
                },
            )
            .is_some();

        info!(
            client_id = %client_id,
            %role,
            booking = filter_reference.as_deref().unwrap_or("-"),
            replaced,
            total = self.clients.len(),
            "subscriber connected"
        );

        SubscriberStream {
            client_id,
            token,
            rx,
            registry: self.clone(),
        }
    }

    /// Remove a subscriber. Unknown ids are ignored.
    pub fn unregister(&self, client_id: &str) {
        if self.clients.remove(client_id).is_some() {
            info!(client_id, total = self.clients.len(), "subscriber disconnected");
        }
    }

    /// Remove `client_id` only if it still belongs to the connection `token`.
    fn unregister_connection(&self, client_id: &str, token: u64) {
        if self
            .clients
            .remove_if(client_id, |_, sub| sub.token == token)
            .is_some()
        {
            info!(client_id, total = self.clients.len(), "subscriber disconnected");
        }
    }

    /// Deliver `event` to every matching subscriber. Returns how many
    /// subscribers accepted the frame.
    pub fn broadcast(&self, event: &Event) -> usize {
        let frame = event.to_frame().encode();
        let (delivered, _) = self.fan_out(&frame, |sub| {
            event.matches(sub.role, sub.filter_reference.as_deref())
        });
        if delivered > 0 {
            debug!(event = %event.kind, delivered, "event broadcast");
        }
        delivered
    }

    /// Write a heartbeat to every subscriber and drop those whose write
    /// fails. Returns the number of subscribers pruned.
    pub fn sweep_heartbeat(&self) -> usize {
        let frame = heartbeat_frame().encode();
        let (_, pruned) = self.fan_out(&frame, |_| true);
        if pruned > 0 {
            info!(pruned, remaining = self.clients.len(), "heartbeat pruned dead subscribers");
        }
        pruned
    }

    /// Non-blocking write to each subscriber selected by `wants`.
    /// Returns `(delivered, pruned)`.
    ///
    /// Dead subscribers are collected during iteration and removed afterwards;
    /// removing while the map is being iterated would deadlock on its shard.
    fn fan_out(&self, frame: &str, wants: impl Fn(&Subscriber) -> bool) -> (usize, usize) {
        let mut delivered = 0;
        let mut dead: Vec<(String, u64)> = Vec::new();

        for entry in self.clients.iter() {
            let sub = entry.value();
            if !wants(sub) {
                continue;
            }
            match sub.tx.try_send(frame.to_string()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => {
                    warn!(client_id = %entry.key(), "subscriber buffer full, dropping slow consumer");
                    dead.push((entry.key().clone(), sub.token));
                }
                Err(TrySendError::Closed(_)) => {
                    debug!(client_id = %entry.key(), "subscriber stream closed");
                    dead.push((entry.key().clone(), sub.token));
                }
            }
        }

        let pruned = dead.len();
        for (client_id, token) in dead {
            self.unregister_connection(&client_id, token);
        }
        (delivered, pruned)
    }

    /// Drop every subscriber, ending all open streams. Used on shutdown so
    /// long-lived responses let the server drain.
    pub fn disconnect_all(&self) -> usize {
        let n = self.clients.len();
        self.clients.clear();
        if n > 0 {
            info!(disconnected = n, "all subscribers disconnected");
        }
        n
    }

    pub fn stats(&self) -> RegistryStats {
        let mut stats = RegistryStats::default();
        for entry in self.clients.iter() {
            match entry.value().role {
                Role::Admin => stats.admin += 1,
                Role::Customer => stats.customer += 1,
            }
        }
        stats.total = stats.admin + stats.customer;
        stats
    }

    pub fn subscribers(&self) -> Vec<SubscriberInfo> {
        let mut list: Vec<SubscriberInfo> = self
            .clients
            .iter()
            .map(|e| SubscriberInfo {
                client_id: e.key().clone(),
                role: e.value().role,
                filter_reference: e.value().filter_reference.clone(),
                connected_at: e.value().connected_at.clone(),
            })
            .collect();
        list.sort_by(|a, b| a.connected_at.cmp(&b.connected_at));
        list
    }

    pub fn contains(&self, client_id: &str) -> bool {
        self.clients.contains_key(client_id)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new(herald_core::config::SUBSCRIBER_BUFFER)
    }
}

/// Receiving end of one subscriber's frames, already SSE-encoded.
///
/// Dropping the stream (the HTTP client went away) unregisters the
/// subscriber immediately.
pub struct SubscriberStream {
    client_id: String,
    token: u64,
    rx: mpsc::Receiver<String>,
    registry: ConnectionRegistry,
}

impl SubscriberStream {
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Stop accepting frames; the next write to this subscriber fails and
    /// prunes it.
    pub fn close(&mut self) {
        self.rx.close();
    }

    /// Next queued frame without waiting.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

impl Stream for SubscriberStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for SubscriberStream {
    fn drop(&mut self) {
        self.registry.unregister_connection(&self.client_id, self.token);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use herald_protocol::SseFrame;

    fn drain(stream: &mut SubscriberStream) -> Vec<SseFrame> {
        let mut frames = Vec::new();
        while let Some(raw) = stream.try_recv() {
            frames.push(SseFrame::decode(&raw).expect("valid frame"));
        }
        frames
    }

    fn event_names(stream: &mut SubscriberStream) -> Vec<String> {
        drain(stream).into_iter().map(|f| f.event).collect()
    }

    fn admin_event(kind: &str) -> Event {
        Event::new(kind, Role::Admin, serde_json::json!({"k": kind}))
    }

    #[test]
    fn connected_frame_comes_first() {
        let registry = ConnectionRegistry::new(8);
        let mut stream = registry.register("a1", Role::Admin, None);
        registry.broadcast(&admin_event("booking_created"));

        let frames = drain(&mut stream);
        assert_eq!(frames[0].event, "connected");
        assert_eq!(frames[0].data["clientId"], "a1");
        assert_eq!(frames[1].event, "booking_created");
    }

    #[test]
    fn broadcast_only_reaches_matching_subscribers() {
        let registry = ConnectionRegistry::new(8);
        let mut admin = registry.register("admin", Role::Admin, None);
        let mut cust_a = registry.register("cust-a", Role::Customer, Some("FLY-A".into()));
        let mut cust_b = registry.register("cust-b", Role::Customer, Some("FLY-B".into()));
        let mut cust_any = registry.register("cust-any", Role::Customer, None);
        for s in [&mut admin, &mut cust_a, &mut cust_b, &mut cust_any] {
            drain(s);
        }

        let ev = Event::new("booking_ticketed", Role::Customer, serde_json::json!({}))
            .for_reference("FLY-A");
        assert_eq!(registry.broadcast(&ev), 2);

        assert!(drain(&mut admin).is_empty());
        assert_eq!(event_names(&mut cust_a), vec!["booking_ticketed"]);
        assert!(drain(&mut cust_b).is_empty());
        assert_eq!(event_names(&mut cust_any), vec!["booking_ticketed"]);
    }

    #[test]
    fn unregister_unknown_is_noop() {
        let registry = ConnectionRegistry::new(8);
        let _s = registry.register("known", Role::Admin, None);
        registry.unregister("never-registered");
        registry.unregister("never-registered");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn per_subscriber_order_is_preserved() {
        let registry = ConnectionRegistry::new(16);
        let mut stream = registry.register("a1", Role::Admin, None);
        drain(&mut stream);

        for kind in ["e1", "e2", "e3", "e4"] {
            registry.broadcast(&admin_event(kind));
        }
        assert_eq!(event_names(&mut stream), vec!["e1", "e2", "e3", "e4"]);
    }

    #[test]
    fn dead_stream_is_pruned_on_broadcast() {
        let registry = ConnectionRegistry::new(8);
        let mut alive = registry.register("alive", Role::Admin, None);
        let mut dead = registry.register("dead", Role::Admin, None);
        dead.close();

        assert_eq!(registry.broadcast(&admin_event("booking_created")), 1);
        assert!(!registry.contains("dead"));
        assert!(registry.contains("alive"));
        assert_eq!(drain(&mut alive).len(), 2);
    }

    #[test]
    fn heartbeat_failure_unregisters_before_next_broadcast() {
        let registry = ConnectionRegistry::new(8);
        let mut stream = registry.register("c1", Role::Customer, Some("FLY-1".into()));
        stream.close();

        assert_eq!(registry.sweep_heartbeat(), 1);
        assert!(registry.is_empty());

        let ev = Event::new("booking_ticketed", Role::Customer, serde_json::json!({}))
            .for_reference("FLY-1");
        assert_eq!(registry.broadcast(&ev), 0);
    }

    #[test]
    fn heartbeat_reaches_every_live_subscriber() {
        let registry = ConnectionRegistry::new(8);
        let mut a = registry.register("a", Role::Admin, None);
        let mut c = registry.register("c", Role::Customer, Some("FLY-1".into()));
        drain(&mut a);
        drain(&mut c);

        assert_eq!(registry.sweep_heartbeat(), 0);
        assert_eq!(event_names(&mut a), vec!["heartbeat"]);
        assert_eq!(event_names(&mut c), vec!["heartbeat"]);
    }

    #[test]
    fn slow_consumer_is_dropped_when_buffer_fills() {
        let registry = ConnectionRegistry::new(2);
        let _stream = registry.register("slow", Role::Admin, None);
        // Buffer holds `connected` + one event; the next write overflows.
        assert_eq!(registry.broadcast(&admin_event("e1")), 1);
        assert_eq!(registry.broadcast(&admin_event("e2")), 0);
        assert!(!registry.contains("slow"));
    }

    #[test]
    fn dropping_stream_unregisters() {
        let registry = ConnectionRegistry::new(8);
        let stream = registry.register("c1", Role::Admin, None);
        assert!(registry.contains("c1"));
        drop(stream);
        assert!(!registry.contains("c1"));
    }

    #[test]
    fn reconnect_with_same_id_survives_old_stream_drop() {
        let registry = ConnectionRegistry::new(8);
        let old = registry.register("dup", Role::Admin, None);
        let mut new = registry.register("dup", Role::Admin, None);
        drop(old);

        assert!(registry.contains("dup"));
        drain(&mut new);
        assert_eq!(registry.broadcast(&admin_event("e1")), 1);
        assert_eq!(event_names(&mut new), vec!["e1"]);
    }

    #[tokio::test]
    async fn disconnect_all_ends_streams() {
        let registry = ConnectionRegistry::new(8);
        let mut a = registry.register("a", Role::Admin, None);
        let mut b = registry.register("b", Role::Customer, Some("REF".into()));
        assert_eq!(registry.disconnect_all(), 2);
        assert!(registry.is_empty());

        assert!(a.recv().await.unwrap().contains("event: connected"));
        assert_eq!(a.recv().await, None);
        assert!(b.recv().await.is_some());
        assert_eq!(b.recv().await, None);
    }

    #[test]
    fn stats_count_roles() {
        let registry = ConnectionRegistry::new(8);
        let _a = registry.register("a", Role::Admin, None);
        let _b = registry.register("b", Role::Customer, None);
        let _c = registry.register("c", Role::Customer, Some("FLY-1".into()));

        assert_eq!(
            registry.stats(),
            RegistryStats {
                admin: 1,
                customer: 2,
                total: 3
            }
        );
        assert_eq!(registry.subscribers().len(), 3);
    }

    #[tokio::test]
    async fn stream_yields_frames_asynchronously() {
        use futures_util::StreamExt;

        let registry = ConnectionRegistry::new(8);
        let mut stream = registry.register("a", Role::Admin, None);
        let first = stream.next().await.expect("connected");
        assert!(first.contains("event: connected"));

        let r = registry.clone();
        tokio::spawn(async move {
            r.broadcast(&admin_event("booking_created"));
        });
        let next = stream.next().await.expect("event");
        assert!(next.contains("event: booking_created"));
    }
}
