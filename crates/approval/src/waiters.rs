//! Per-request resolution wake channels.
//!
//! Each awaited request gets a `tokio::sync::watch` channel holding
//! `Option<Resolution>`. Waiters subscribe and suspend on the receiver, so
//! any number of guard clients can await the same request without touching
//! the store or holding a lock while suspended. The winning transition
//! publishes the resolution once and drops the channel.

use std::collections::HashMap;

use tokio::sync::{watch, Mutex};

use gatepass_core::approval::Resolution;
use gatepass_core::types::RequestId;

/// Registry of in-flight resolution waiters, keyed by request id.
#[derive(Default)]
pub struct ResolutionWaiters {
    inner: Mutex<HashMap<RequestId, watch::Sender<Option<Resolution>>>>,
}

impl ResolutionWaiters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to the resolution of `id`, creating the channel on first use.
    pub async fn register(&self, id: RequestId) -> watch::Receiver<Option<Resolution>> {
        let mut inner = self.inner.lock().await;
        inner
            .entry(id)
            .or_insert_with(|| watch::channel(None).0)
            .subscribe()
    }

    /// Wake every waiter for `id` with the final resolution and drop the
    /// channel. A request resolves once, so the entry is never needed again.
    pub async fn notify(&self, id: RequestId, resolution: Resolution) {
        if let Some(sender) = self.inner.lock().await.remove(&id) {
            // Send only fails when no receiver is left, which is fine.
            let _ = sender.send(Some(resolution));
        }
    }

    /// Drop the channel for `id` when no waiters remain.
    ///
    /// Called by waiters on their way out so channels for requests that
    /// never resolve through this process (or that were already resolved
    /// when awaited) do not accumulate.
    pub async fn release(&self, id: RequestId) {
        let mut inner = self.inner.lock().await;
        if let Some(sender) = inner.get(&id) {
            if sender.receiver_count() == 0 {
                inner.remove(&id);
            }
        }
    }

    /// Number of request ids with a live channel.
    pub async fn active_count(&self) -> usize {
        self.inner.lock().await.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use gatepass_core::approval::{EntryState, ResolvedBy};

    fn resolution(state: EntryState) -> Resolution {
        Resolution {
            state,
            resolved_by: ResolvedBy::Resident,
            resolved_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn notify_wakes_all_registered_waiters() {
        let waiters = ResolutionWaiters::new();
        let id = uuid::Uuid::new_v4();

        let mut rx1 = waiters.register(id).await;
        let mut rx2 = waiters.register(id).await;

        waiters.notify(id, resolution(EntryState::Approved)).await;

        let seen1 = rx1.wait_for(|r| r.is_some()).await.unwrap().clone().unwrap();
        let seen2 = rx2.wait_for(|r| r.is_some()).await.unwrap().clone().unwrap();
        assert_eq!(seen1.state, EntryState::Approved);
        assert_eq!(seen2.state, EntryState::Approved);

        // The channel is dropped with the notification.
        assert_eq!(waiters.active_count().await, 0);
    }

    #[tokio::test]
    async fn notify_without_waiters_is_a_noop() {
        let waiters = ResolutionWaiters::new();
        waiters
            .notify(uuid::Uuid::new_v4(), resolution(EntryState::Declined))
            .await;
        assert_eq!(waiters.active_count().await, 0);
    }

    #[tokio::test]
    async fn release_drops_idle_channels_only() {
        let waiters = ResolutionWaiters::new();
        let id = uuid::Uuid::new_v4();

        let rx1 = waiters.register(id).await;
        let rx2 = waiters.register(id).await;

        drop(rx1);
        waiters.release(id).await;
        // rx2 still subscribed; the channel must survive.
        assert_eq!(waiters.active_count().await, 1);

        drop(rx2);
        waiters.release(id).await;
        assert_eq!(waiters.active_count().await, 0);
    }
}
