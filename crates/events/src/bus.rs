//! In-process event bus backed by a `tokio::sync::broadcast` channel.
//!
//! [`EventBus`] is the publish/subscribe hub for [`GateEvent`]s. It is
//! shared via `Arc<EventBus>` across the application; in-process consumers
//! (long-poll waiters, tests, future socket fan-out) subscribe to observe
//! the entry-request lifecycle.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use gatepass_core::types::{RequestId, Timestamp};

// ---------------------------------------------------------------------------
// Event type names
// ---------------------------------------------------------------------------

/// A guard created a new entry request.
pub const EVENT_REQUEST_CREATED: &str = "entry_request.created";

/// An entry request reached its terminal state.
pub const EVENT_REQUEST_RESOLVED: &str = "entry_request.resolved";

/// An outbound notification, published on the bus when no external push
/// gateway is configured.
pub const EVENT_NOTIFICATION_OUTBOUND: &str = "notification.outbound";

/// The dispatcher exhausted its retries for a notification. Observability
/// only; request state is unaffected.
pub const EVENT_DELIVERY_FAILED: &str = "notification.delivery_failed";

// ---------------------------------------------------------------------------
// GateEvent
// ---------------------------------------------------------------------------

/// A domain event tied to one entry request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateEvent {
    /// Dot-separated event name, e.g. `"entry_request.resolved"`.
    pub event_type: String,

    /// The entry request this event concerns.
    pub request_id: RequestId,

    /// Free-form JSON payload carrying event-specific data.
    pub payload: serde_json::Value,

    /// When the event was created (UTC).
    pub timestamp: Timestamp,
}

impl GateEvent {
    /// Create a new event with an empty payload.
    pub fn new(event_type: impl Into<String>, request_id: RequestId) -> Self {
        Self {
            event_type: event_type.into(),
            request_id,
            payload: serde_json::Value::Object(Default::default()),
            timestamp: chrono::Utc::now(),
        }
    }

    /// Set the JSON payload for the event.
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// In-process fan-out event bus.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every published [`GateEvent`].
pub struct EventBus {
    sender: broadcast::Sender<GateEvent>,
}

impl EventBus {
    /// Create a bus with a specific channel capacity.
    ///
    /// When the buffer is full, the oldest un-consumed messages are dropped
    /// and slow receivers will observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all current subscribers.
    ///
    /// If there are no active subscribers the event is silently dropped.
    pub fn publish(&self, event: GateEvent) {
        // Ignore the SendError -- it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events published on this bus.
    pub fn subscribe(&self) -> broadcast::Receiver<GateEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
