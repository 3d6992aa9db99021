//! Outbound notification messages.
//!
//! Two message kinds cross the notification boundary: `NewRequest` to the
//! resident when a guard raises a request, and `RequestResolved` to the
//! guard when the request reaches a terminal state. Delivery is
//! at-least-once; consumers dedupe on `request_id` + `state`.

use serde::{Deserialize, Serialize};

use gatepass_core::approval::EntryState;
use gatepass_core::types::{RequestId, Timestamp};
use gatepass_db::models::EntryRequest;

/// What a notification is telling its recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A new entry request awaits the resident's decision.
    NewRequest,
    /// The request reached a terminal state; the guard can act on it.
    RequestResolved,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationKind::NewRequest => "new_request",
            NotificationKind::RequestResolved => "request_resolved",
        }
    }
}

/// One outbound message addressed to a single party.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Notification {
    pub kind: NotificationKind,
    /// Recipient user id (resident for `NewRequest`, guard for
    /// `RequestResolved`). Also the delivery-attempt counter key.
    pub target: String,
    pub request_id: RequestId,
    /// Request state at the time the notification was produced; half of
    /// the consumer-side dedupe key.
    pub state: EntryState,
    /// Message body forwarded verbatim to the transport.
    pub body: serde_json::Value,
    pub created_at: Timestamp,
}

impl Notification {
    /// Notify the resident that a guard raised a request for them.
    pub fn new_request(request: &EntryRequest) -> Self {
        Self {
            kind: NotificationKind::NewRequest,
            target: request.resident_id.clone(),
            request_id: request.id,
            state: request.state,
            body: serde_json::json!({
                "guard_id": request.guard_id,
                "visitor": request.visitor,
                "expires_at": request.expires_at,
            }),
            created_at: chrono::Utc::now(),
        }
    }

    /// Notify the guard of the request's terminal outcome.
    pub fn request_resolved(request: &EntryRequest) -> Self {
        Self {
            kind: NotificationKind::RequestResolved,
            target: request.guard_id.clone(),
            request_id: request.id,
            state: request.state,
            body: serde_json::json!({
                "state": request.state,
                "resolved_at": request.resolved_at,
                "resolved_by": request.resolved_by,
            }),
            created_at: chrono::Utc::now(),
        }
    }

    /// The key consumers dedupe repeated deliveries on.
    pub fn dedupe_key(&self) -> (RequestId, EntryState) {
        (self.request_id, self.state)
    }
}
