//! The entry-request coordinator.
//!
//! Single owner of a request's lifecycle. Every terminal transition
//! (resident decision, guard cancellation, scheduler timeout) funnels
//! through one compare-and-set path against the store; whichever caller
//! wins the CAS performs the side effects (waiter wakeup, guard
//! notification) exactly once, and every loser observes the actual
//! resolution instead of overwriting it.

use std::sync::Arc;
use std::time::Duration;

use gatepass_core::approval::{Decision, EntryState, Resolution, ResolvedBy};
use gatepass_core::error::CoreError;
use gatepass_core::timeouts::TimeoutPolicy;
use gatepass_core::types::{RequestId, Timestamp};
use gatepass_core::visitor::VisitorPayload;
use gatepass_db::models::{EntryRequest, StatusView};
use gatepass_db::{CasOutcome, EntryStore, StoreError};
use gatepass_events::bus::{EVENT_REQUEST_CREATED, EVENT_REQUEST_RESOLVED};
use gatepass_events::{EventBus, GateEvent, Notification, NotificationDispatcher};

use crate::scheduler::TimeoutScheduler;
use crate::waiters::ResolutionWaiters;

/// Outcome of an attempted terminal transition.
enum Transition {
    /// This caller won the race; carries the resolution it produced.
    Applied(Resolution),
    /// Another transition got there first; carries what actually happened.
    Lost(Resolution),
}

/// Coordinates visitor entry requests from creation to terminal state.
pub struct EntryCoordinator {
    store: Arc<dyn EntryStore>,
    bus: Arc<EventBus>,
    dispatcher: Arc<NotificationDispatcher>,
    scheduler: TimeoutScheduler,
    waiters: ResolutionWaiters,
    timeouts: TimeoutPolicy,
}

impl EntryCoordinator {
    pub fn new(
        store: Arc<dyn EntryStore>,
        bus: Arc<EventBus>,
        dispatcher: Arc<NotificationDispatcher>,
        timeouts: TimeoutPolicy,
    ) -> Arc<Self> {
        Arc::new(Self {
            store,
            bus,
            dispatcher,
            scheduler: TimeoutScheduler::new(),
            waiters: ResolutionWaiters::new(),
            timeouts,
        })
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Create a pending entry request on behalf of a guard.
    ///
    /// Persists the record, schedules its timeout, and dispatches the
    /// `NewRequest` notification to the resident. Fails closed: if the
    /// record cannot be persisted there is no request and no timer.
    pub async fn create(
        self: &Arc<Self>,
        guard_id: &str,
        resident_id: &str,
        visitor: VisitorPayload,
    ) -> Result<EntryRequest, CoreError> {
        visitor.check()?;

        if !self
            .store
            .resident_exists(resident_id)
            .await
            .map_err(store_error)?
        {
            return Err(CoreError::UnknownResident(resident_id.to_string()));
        }

        let window = self.timeouts.duration_for(visitor.category);
        let timeout = chrono::Duration::from_std(window)
            .map_err(|e| CoreError::Internal(format!("timeout window out of range: {e}")))?;

        let request = EntryRequest::new(guard_id, resident_id, visitor, timeout);
        self.store.insert(&request).await.map_err(store_error)?;

        self.schedule_timeout(request.id, request.expires_at).await;
        self.dispatcher.publish(Notification::new_request(&request));
        self.bus.publish(
            GateEvent::new(EVENT_REQUEST_CREATED, request.id).with_payload(serde_json::json!({
                "guard_id": request.guard_id,
                "resident_id": request.resident_id,
                "category": request.visitor.category,
                "expires_at": request.expires_at,
            })),
        );

        tracing::info!(
            request_id = %request.id,
            guard_id = %request.guard_id,
            resident_id = %request.resident_id,
            category = %request.visitor.category,
            "Entry request created"
        );
        Ok(request)
    }

    // -----------------------------------------------------------------------
    // Terminal transitions
    // -----------------------------------------------------------------------

    /// Apply a resident's decision.
    ///
    /// `actor` must be the resident on the record. A request that already
    /// left `Pending` yields [`CoreError::AlreadyResolved`] carrying the
    /// actual resolution, including when the earlier resolution was the
    /// same decision (one reconciliation path for stale clients).
    pub async fn resolve(
        &self,
        id: RequestId,
        actor: &str,
        decision: Decision,
    ) -> Result<Resolution, CoreError> {
        let current = self.fetch(id).await?;
        if current.resident_id != actor {
            return Err(CoreError::Forbidden(format!(
                "'{actor}' is not the resident for request {id}"
            )));
        }

        match self
            .try_transition(id, decision.terminal_state(), ResolvedBy::Resident)
            .await?
        {
            Transition::Applied(resolution) => Ok(resolution),
            Transition::Lost(actual) => Err(CoreError::AlreadyResolved { actual }),
        }
    }

    /// Withdraw a request; only the owning guard may do this, and only
    /// while the request is still pending.
    pub async fn cancel(&self, id: RequestId, actor: &str) -> Result<Resolution, CoreError> {
        let current = self.fetch(id).await?;
        if current.guard_id != actor {
            return Err(CoreError::Forbidden(format!(
                "'{actor}' is not the guard for request {id}"
            )));
        }

        match self
            .try_transition(id, EntryState::Cancelled, ResolvedBy::Guard)
            .await?
        {
            Transition::Applied(resolution) => Ok(resolution),
            Transition::Lost(actual) => Err(CoreError::AlreadyResolved { actual }),
        }
    }

    /// Scheduler entry point: time a pending request out.
    ///
    /// Returns whether the timeout applied. Losing the race to a resident
    /// decision or cancellation is the expected no-op, not an error.
    pub async fn handle_timeout(&self, id: RequestId) -> Result<bool, CoreError> {
        match self
            .try_transition(id, EntryState::TimedOut, ResolvedBy::System)
            .await
        {
            Ok(Transition::Applied(_)) => Ok(true),
            Ok(Transition::Lost(actual)) => {
                tracing::debug!(
                    request_id = %id,
                    state = %actual.state,
                    "Late timeout lost the resolution race"
                );
                Ok(false)
            }
            Err(CoreError::NotFound { .. }) => {
                tracing::warn!(request_id = %id, "Timeout fired for unknown request");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// The single CAS path every terminal transition goes through.
    async fn try_transition(
        &self,
        id: RequestId,
        next: EntryState,
        resolved_by: ResolvedBy,
    ) -> Result<Transition, CoreError> {
        let resolved_at = chrono::Utc::now();
        let outcome = self
            .store
            .compare_and_set(id, EntryState::Pending, next, resolved_by, resolved_at)
            .await
            .map_err(store_error)?;

        match outcome {
            CasOutcome::Applied(request) => {
                let resolution = request.resolution().ok_or_else(|| {
                    CoreError::Internal("terminal record missing resolution fields".to_string())
                })?;

                // Winner's side effects: stop the timer, wake waiters, tell
                // the guard. None of these can undo the transition.
                self.scheduler.cancel(id).await;
                self.waiters.notify(id, resolution.clone()).await;
                self.dispatcher
                    .publish(Notification::request_resolved(&request));
                self.bus.publish(
                    GateEvent::new(EVENT_REQUEST_RESOLVED, id).with_payload(serde_json::json!({
                        "state": request.state,
                        "resolved_by": request.resolved_by,
                        "resolved_at": request.resolved_at,
                    })),
                );

                tracing::info!(
                    request_id = %id,
                    state = %request.state,
                    resolved_by = %resolved_by,
                    "Entry request resolved"
                );
                Ok(Transition::Applied(resolution))
            }
            CasOutcome::Conflict(current) => {
                let actual = current.resolution().ok_or_else(|| {
                    CoreError::Internal("conflicting record is not terminal".to_string())
                })?;
                Ok(Transition::Lost(actual))
            }
            CasOutcome::Missing => Err(CoreError::NotFound { id }),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Current status of a request. Safe to poll.
    pub async fn get_status(&self, id: RequestId) -> Result<StatusView, CoreError> {
        Ok(self.fetch(id).await?.status())
    }

    /// Block until the request leaves `Pending` or `max_wait` elapses,
    /// returning the current status either way.
    ///
    /// Suspends on a per-request wake channel; no store lock is held while
    /// waiting, and any number of clients can await the same request.
    /// `max_wait` bounds only this call and never mutates request state.
    pub async fn await_resolution(
        &self,
        id: RequestId,
        max_wait: Duration,
    ) -> Result<StatusView, CoreError> {
        // Register before reading so a resolution landing in between is
        // observed either in the snapshot or on the channel.
        let mut rx = self.waiters.register(id).await;

        let current = match self.fetch(id).await {
            Ok(record) => record,
            Err(e) => {
                drop(rx);
                self.waiters.release(id).await;
                return Err(e);
            }
        };
        if current.state.is_terminal() {
            drop(rx);
            self.waiters.release(id).await;
            return Ok(current.status());
        }

        let woken = match tokio::time::timeout(max_wait, rx.wait_for(|r| r.is_some())).await {
            Ok(Ok(value)) => (*value).clone(),
            // Timed out, or the channel closed without a value; fall back
            // to whatever the store says now.
            _ => None,
        };

        drop(rx);
        self.waiters.release(id).await;

        match woken {
            Some(resolution) => Ok(StatusView {
                request_id: id,
                state: resolution.state,
                resolved_at: Some(resolution.resolved_at),
                resolved_by: Some(resolution.resolved_by),
            }),
            None => Ok(self.fetch(id).await?.status()),
        }
    }

    // -----------------------------------------------------------------------
    // Recovery / lifecycle
    // -----------------------------------------------------------------------

    /// Re-arm timers after a restart.
    ///
    /// Loads every pending request from the store, immediately times out
    /// those already past expiry, and re-schedules the rest. Returns the
    /// number of pending requests processed.
    ///
    /// The listing is unconditional: records written under an earlier,
    /// longer timeout policy still get their timer back.
    pub async fn recover(self: &Arc<Self>) -> Result<usize, CoreError> {
        let pending = self.store.list_pending().await.map_err(store_error)?;
        let count = pending.len();
        let now = chrono::Utc::now();

        for request in pending {
            if request.expires_at <= now {
                if let Err(e) = self.handle_timeout(request.id).await {
                    tracing::error!(
                        request_id = %request.id,
                        error = %e,
                        "Failed to time out overdue request during recovery"
                    );
                }
            } else {
                self.schedule_timeout(request.id, request.expires_at).await;
            }
        }

        if count > 0 {
            tracing::info!(count, "Recovered pending entry requests");
        }
        Ok(count)
    }

    /// Store liveness, for health endpoints.
    pub async fn health(&self) -> Result<(), CoreError> {
        self.store.health().await.map_err(store_error)
    }

    /// Cancel all outstanding timers (graceful shutdown).
    pub async fn shutdown(&self) {
        self.scheduler.cancel_all().await;
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    async fn schedule_timeout(self: &Arc<Self>, id: RequestId, expires_at: Timestamp) {
        let coordinator = Arc::clone(self);
        self.scheduler
            .schedule(id, expires_at, move || async move {
                if let Err(e) = coordinator.handle_timeout(id).await {
                    tracing::error!(request_id = %id, error = %e, "Timeout handling failed");
                }
            })
            .await;
    }

    async fn fetch(&self, id: RequestId) -> Result<EntryRequest, CoreError> {
        self.store
            .get(id)
            .await
            .map_err(store_error)?
            .ok_or(CoreError::NotFound { id })
    }
}

fn store_error(e: StoreError) -> CoreError {
    CoreError::Internal(e.to_string())
}
