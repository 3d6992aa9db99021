//! The request-store boundary.
//!
//! [`EntryStore`] is the single source of truth for entry-request records.
//! Its `compare_and_set` is the single-writer mechanism that serializes the
//! resident/timeout/cancel race: the first terminal transition to reach the
//! store wins, every later attempt observes the current record instead.

use async_trait::async_trait;

use gatepass_core::approval::{EntryState, ResolvedBy};
use gatepass_core::types::{RequestId, Timestamp};

use crate::models::EntryRequest;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Infrastructure-level store failures.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying database rejected or failed the operation.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A persisted record failed to decode into its domain representation.
    #[error("corrupt record: {0}")]
    Corrupt(String),

    /// An insert reused an existing request id.
    #[error("duplicate entry request id {0}")]
    DuplicateId(RequestId),
}

// ---------------------------------------------------------------------------
// CasOutcome
// ---------------------------------------------------------------------------

/// Result of a conditional state transition.
#[derive(Debug)]
pub enum CasOutcome {
    /// The record was in the expected state; the transition was applied.
    /// Carries the updated record.
    Applied(EntryRequest),
    /// The record was not in the expected state; nothing was written.
    /// Carries the current record so the caller can reconcile.
    Conflict(EntryRequest),
    /// No record exists with the given id.
    Missing,
}

// ---------------------------------------------------------------------------
// EntryStore
// ---------------------------------------------------------------------------

/// Keyed storage for entry-request records.
///
/// Implementations must make `compare_and_set` atomic per request id; no
/// other coordination is required across requests.
#[async_trait]
pub trait EntryStore: Send + Sync {
    /// Persist a fresh record. Fails on id reuse.
    async fn insert(&self, request: &EntryRequest) -> Result<(), StoreError>;

    /// Fetch a record by id.
    async fn get(&self, id: RequestId) -> Result<Option<EntryRequest>, StoreError>;

    /// Atomically transition `id` from `expected` to `next`, stamping the
    /// resolution fields. See [`CasOutcome`] for the three possible results.
    async fn compare_and_set(
        &self,
        id: RequestId,
        expected: EntryState,
        next: EntryState,
        resolved_by: ResolvedBy,
        resolved_at: Timestamp,
    ) -> Result<CasOutcome, StoreError>;

    /// Every `Pending` record, ordered by expiry. Used by timeout
    /// recovery on startup, which must see all open requests regardless
    /// of how the timeout policy has changed since they were written.
    async fn list_pending(&self) -> Result<Vec<EntryRequest>, StoreError>;

    /// Whether the resident id is known to the society directory.
    async fn resident_exists(&self, resident_id: &str) -> Result<bool, StoreError>;

    /// Bump the delivery-attempt counter for a notification target and
    /// return the new count. Mutated only by the dispatcher.
    async fn record_delivery_attempt(
        &self,
        id: RequestId,
        target: &str,
    ) -> Result<u32, StoreError>;

    /// Liveness probe for health endpoints.
    async fn health(&self) -> Result<(), StoreError>;
}
