use crate::approval::Resolution;
use crate::types::RequestId;

/// Domain-level error taxonomy for the entry-approval workflow.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    /// The visitor payload failed validation (missing name, bad category, ...).
    #[error("Invalid visitor payload: {0}")]
    InvalidVisitorPayload(String),

    /// The target resident (or flat) does not exist.
    #[error("Unknown resident: {0}")]
    UnknownResident(String),

    /// No entry request exists with the given id.
    #[error("Entry request {id} not found")]
    NotFound { id: RequestId },

    /// The acting party does not match the request's guard or resident.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The request already left `Pending`. Carries the actual resolution so
    /// the caller can reconcile a stale view instead of retrying.
    #[error("Entry request already resolved as {}", .actual.state)]
    AlreadyResolved { actual: Resolution },

    /// Infrastructure failure (store, scheduler). Never exposes internals
    /// to API clients.
    #[error("Internal error: {0}")]
    Internal(String),
}
