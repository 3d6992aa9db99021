//! The entry-request record and its status projection.

use serde::Serialize;

use gatepass_core::approval::{EntryState, Resolution, ResolvedBy};
use gatepass_core::types::{RequestId, Timestamp};
use gatepass_core::visitor::VisitorPayload;

/// One visitor entry request, from creation to terminal resolution.
///
/// All fields except `state`, `resolved_at`, and `resolved_by` are
/// immutable after creation, and those three change exactly once, together,
/// on the terminal transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryRequest {
    pub id: RequestId,
    /// The guard who raised the request at the gate.
    pub guard_id: String,
    /// The resident who must answer it.
    pub resident_id: String,
    /// Visitor details, opaque to the state machine.
    pub visitor: VisitorPayload,
    pub state: EntryState,
    pub created_at: Timestamp,
    /// `created_at` plus the category's approval window. Never extended.
    pub expires_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<ResolvedBy>,
}

impl EntryRequest {
    /// Build a fresh `Pending` record with a newly allocated id.
    pub fn new(
        guard_id: impl Into<String>,
        resident_id: impl Into<String>,
        visitor: VisitorPayload,
        timeout: chrono::Duration,
    ) -> Self {
        let created_at = chrono::Utc::now();
        Self {
            id: uuid::Uuid::new_v4(),
            guard_id: guard_id.into(),
            resident_id: resident_id.into(),
            visitor,
            state: EntryState::Pending,
            created_at,
            expires_at: created_at + timeout,
            resolved_at: None,
            resolved_by: None,
        }
    }

    /// The terminal resolution, if the request has one.
    ///
    /// `None` exactly while the request is `Pending`.
    pub fn resolution(&self) -> Option<Resolution> {
        match (self.state.is_terminal(), self.resolved_at, self.resolved_by) {
            (true, Some(resolved_at), Some(resolved_by)) => Some(Resolution {
                state: self.state,
                resolved_by,
                resolved_at,
            }),
            _ => None,
        }
    }

    /// Project the record into the shape returned by status queries.
    pub fn status(&self) -> StatusView {
        StatusView {
            request_id: self.id,
            state: self.state,
            resolved_at: self.resolved_at,
            resolved_by: self.resolved_by,
        }
    }
}

/// The `{state, resolved_at, resolved_by}` shape returned by `GetStatus`
/// and `Await`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusView {
    pub request_id: RequestId,
    pub state: EntryState,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<ResolvedBy>,
}
