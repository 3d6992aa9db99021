//! At-least-once notification dispatcher.
//!
//! [`NotificationDispatcher::publish`] is fire-and-forget relative to the
//! state transition that triggered it: each notification gets its own
//! spawned delivery task with bounded exponential-backoff retry. Exhausting
//! the configured attempts publishes a delivery-failure event on the bus and
//! nothing else; delivery failure never rolls back a resolution.

use std::sync::Arc;

use gatepass_db::EntryStore;

use crate::bus::{EventBus, GateEvent, EVENT_DELIVERY_FAILED, EVENT_NOTIFICATION_OUTBOUND};
use crate::config::DispatchConfig;
use crate::delivery::push::{PushDelivery, PushError};
use crate::message::Notification;

/// Delivers notifications with retry, off the state machine's hot path.
pub struct NotificationDispatcher {
    store: Arc<dyn EntryStore>,
    bus: Arc<EventBus>,
    push: Option<PushDelivery>,
    config: DispatchConfig,
}

impl NotificationDispatcher {
    /// Create a dispatcher. A push channel is opened when the config
    /// carries a gateway URL; otherwise deliveries go to the event bus.
    pub fn new(store: Arc<dyn EntryStore>, bus: Arc<EventBus>, config: DispatchConfig) -> Self {
        let push = config
            .push_gateway_url
            .as_deref()
            .map(PushDelivery::new);
        Self {
            store,
            bus,
            push,
            config,
        }
    }

    /// Enqueue a notification for delivery and return immediately.
    pub fn publish(self: &Arc<Self>, notification: Notification) {
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.deliver_with_retry(notification).await;
        });
    }

    /// Drive one notification to delivery or retry exhaustion.
    async fn deliver_with_retry(&self, notification: Notification) {
        let max_attempts = self.config.max_attempts.max(1);

        for attempt in 0..max_attempts {
            // Attempt counters are dispatcher-owned metadata; failing to
            // record one must not block delivery.
            if let Err(e) = self
                .store
                .record_delivery_attempt(notification.request_id, &notification.target)
                .await
            {
                tracing::warn!(
                    request_id = %notification.request_id,
                    error = %e,
                    "Failed to record delivery attempt"
                );
            }

            match self.try_deliver(&notification).await {
                Ok(()) => {
                    tracing::debug!(
                        request_id = %notification.request_id,
                        target = %notification.target,
                        kind = notification.kind.as_str(),
                        attempt = attempt + 1,
                        "Notification delivered"
                    );
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        request_id = %notification.request_id,
                        target = %notification.target,
                        attempt = attempt + 1,
                        error = %e,
                        "Notification delivery attempt failed"
                    );
                    if attempt + 1 < max_attempts {
                        tokio::time::sleep(self.config.backoff_for(attempt)).await;
                    }
                }
            }
        }

        tracing::error!(
            request_id = %notification.request_id,
            target = %notification.target,
            attempts = max_attempts,
            "Notification delivery failed after all retries"
        );
        self.bus.publish(
            GateEvent::new(EVENT_DELIVERY_FAILED, notification.request_id).with_payload(
                serde_json::json!({
                    "target": notification.target,
                    "kind": notification.kind.as_str(),
                    "state": notification.state,
                    "attempts": max_attempts,
                }),
            ),
        );
    }

    /// One delivery attempt through the configured channel.
    async fn try_deliver(&self, notification: &Notification) -> Result<(), PushError> {
        match &self.push {
            Some(push) => push.send(notification).await,
            // Bus-only mode: in-process consumers are the transport.
            None => {
                self.bus.publish(
                    GateEvent::new(EVENT_NOTIFICATION_OUTBOUND, notification.request_id)
                        .with_payload(serde_json::json!({
                            "kind": notification.kind.as_str(),
                            "target": notification.target,
                            "state": notification.state,
                            "body": notification.body,
                        })),
                );
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
