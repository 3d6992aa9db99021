//! Per-request timeout timers.
//!
//! One spawned task per pending request, sleeping until the request's
//! expiry and then invoking the provided timeout handler. Cancellation is
//! best-effort: the store's compare-and-set already makes a late firing
//! harmless, so a missed cancel costs one no-op wakeup, never correctness.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use gatepass_core::types::{RequestId, Timestamp};

/// One registered timer. The generation distinguishes a timer from its
/// replacement, so a replaced task cleaning up after itself cannot remove
/// the live entry.
struct TimerEntry {
    generation: u64,
    token: CancellationToken,
}

/// Fires a single deferred event per request at its expiry instant.
#[derive(Default)]
pub struct TimeoutScheduler {
    timers: Arc<Mutex<HashMap<RequestId, TimerEntry>>>,
    next_generation: AtomicU64,
}

impl TimeoutScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deferred callback firing at or after `expires_at`.
    ///
    /// Re-scheduling an id replaces (and cancels) the previous timer.
    pub async fn schedule<F, Fut>(&self, id: RequestId, expires_at: Timestamp, on_fire: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();
        {
            let mut timers = self.timers.lock().await;
            let entry = TimerEntry {
                generation,
                token: token.clone(),
            };
            if let Some(previous) = timers.insert(id, entry) {
                previous.token.cancel();
            }
        }

        let delay = (expires_at - chrono::Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        // Anchor the deadline now: a lazily created `sleep` would start
        // counting at the task's first poll, not at schedule time.
        let deadline = tokio::time::Instant::now() + delay;
        let timers = Arc::clone(&self.timers);

        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => {}
                _ = tokio::time::sleep_until(deadline) => {
                    on_fire().await;
                }
            }
            // Only this task's own entry may be cleaned up; a replaced
            // timer must leave its successor's cancel handle in place.
            let mut timers = timers.lock().await;
            if timers
                .get(&id)
                .is_some_and(|entry| entry.generation == generation)
            {
                timers.remove(&id);
            }
        });
    }

    /// Best-effort cancellation of a pending timer.
    pub async fn cancel(&self, id: RequestId) {
        if let Some(entry) = self.timers.lock().await.remove(&id) {
            entry.token.cancel();
        }
    }

    /// Cancel every outstanding timer (shutdown path).
    pub async fn cancel_all(&self) {
        let mut timers = self.timers.lock().await;
        for (_, entry) in timers.drain() {
            entry.token.cancel();
        }
    }

    /// Number of timers currently registered.
    pub async fn active_count(&self) -> usize {
        self.timers.lock().await.len()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn timer_fires_at_expiry() {
        let scheduler = TimeoutScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(30);
        scheduler
            .schedule(uuid::Uuid::new_v4(), expires_at, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        tokio::time::advance(Duration::from_secs(29)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        tokio::time::advance(Duration::from_secs(2)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert_eq!(scheduler.active_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_timer_never_fires() {
        let scheduler = TimeoutScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let id = uuid::Uuid::new_v4();

        let counter = Arc::clone(&fired);
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(30);
        scheduler
            .schedule(id, expires_at, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        scheduler.cancel(id).await;

        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rescheduled_timer_keeps_a_working_cancel_handle() {
        let scheduler = TimeoutScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let id = uuid::Uuid::new_v4();

        let counter = Arc::clone(&fired);
        scheduler
            .schedule(
                id,
                chrono::Utc::now() + chrono::Duration::seconds(30),
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        let counter = Arc::clone(&fired);
        scheduler
            .schedule(
                id,
                chrono::Utc::now() + chrono::Duration::seconds(60),
                move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                },
            )
            .await;

        // Let the replaced task run its cleanup; the replacement's entry
        // must survive it.
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(scheduler.active_count().await, 1);

        // The original expiry passes without a firing.
        tokio::time::advance(Duration::from_secs(31)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);

        // Cancelling through the map still reaches the live timer.
        scheduler.cancel(id).await;
        tokio::time::advance(Duration::from_secs(60)).await;
        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 0);
        assert_eq!(scheduler.active_count().await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn past_expiry_fires_immediately() {
        let scheduler = TimeoutScheduler::new();
        let fired = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&fired);
        let expires_at = chrono::Utc::now() - chrono::Duration::seconds(5);
        scheduler
            .schedule(uuid::Uuid::new_v4(), expires_at, move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .await;

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
}
