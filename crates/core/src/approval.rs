//! Entry-request approval state machine.
//!
//! An entry request starts `Pending` and makes exactly one transition into
//! a terminal state: `Approved` or `Declined` (resident decision),
//! `TimedOut` (scheduler), or `Cancelled` (guard withdrawal). Terminal
//! states admit no further transitions; the store's compare-and-set is the
//! single writer that enforces this.

use serde::{Deserialize, Serialize};

use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// EntryState
// ---------------------------------------------------------------------------

/// Lifecycle state of an entry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryState {
    /// Awaiting a resident decision or timeout.
    Pending,
    /// Resident approved the visitor.
    Approved,
    /// Resident declined the visitor.
    Declined,
    /// No resident decision arrived before `expires_at`.
    TimedOut,
    /// The owning guard withdrew the request while it was still pending.
    Cancelled,
}

impl EntryState {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(self) -> bool {
        !matches!(self, EntryState::Pending)
    }

    /// Stable string form, matching the `entry_requests.state` column values.
    pub fn as_str(self) -> &'static str {
        match self {
            EntryState::Pending => "pending",
            EntryState::Approved => "approved",
            EntryState::Declined => "declined",
            EntryState::TimedOut => "timed_out",
            EntryState::Cancelled => "cancelled",
        }
    }

    /// Whether a transition from `self` to `next` is legal.
    ///
    /// The only legal transitions are `Pending` to a terminal state.
    pub fn can_transition_to(self, next: EntryState) -> bool {
        self == EntryState::Pending && next.is_terminal()
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EntryState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(EntryState::Pending),
            "approved" => Ok(EntryState::Approved),
            "declined" => Ok(EntryState::Declined),
            "timed_out" => Ok(EntryState::TimedOut),
            "cancelled" => Ok(EntryState::Cancelled),
            other => Err(format!("unknown entry state '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Decision
// ---------------------------------------------------------------------------

/// A resident's decision on a pending entry request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Approved,
    Declined,
}

impl Decision {
    /// The terminal state this decision resolves the request into.
    pub fn terminal_state(self) -> EntryState {
        match self {
            Decision::Approved => EntryState::Approved,
            Decision::Declined => EntryState::Declined,
        }
    }
}

// ---------------------------------------------------------------------------
// ResolvedBy
// ---------------------------------------------------------------------------

/// Which party produced the terminal transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedBy {
    /// The resident answered (approve or decline).
    Resident,
    /// The timeout scheduler fired before any answer.
    System,
    /// The owning guard cancelled the request.
    Guard,
}

impl ResolvedBy {
    /// Stable string form, matching the `entry_requests.resolved_by` column.
    pub fn as_str(self) -> &'static str {
        match self {
            ResolvedBy::Resident => "resident",
            ResolvedBy::System => "system",
            ResolvedBy::Guard => "guard",
        }
    }
}

impl std::fmt::Display for ResolvedBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ResolvedBy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resident" => Ok(ResolvedBy::Resident),
            "system" => Ok(ResolvedBy::System),
            "guard" => Ok(ResolvedBy::Guard),
            other => Err(format!("unknown resolver '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// The outcome of a request's single terminal transition.
///
/// Returned to callers that lose the resolution race so a stale client can
/// reconcile against what actually happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub state: EntryState,
    pub resolved_by: ResolvedBy,
    pub resolved_at: Timestamp,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_is_the_only_non_terminal_state() {
        assert!(!EntryState::Pending.is_terminal());
        assert!(EntryState::Approved.is_terminal());
        assert!(EntryState::Declined.is_terminal());
        assert!(EntryState::TimedOut.is_terminal());
        assert!(EntryState::Cancelled.is_terminal());
    }

    #[test]
    fn only_pending_to_terminal_transitions_are_legal() {
        let terminals = [
            EntryState::Approved,
            EntryState::Declined,
            EntryState::TimedOut,
            EntryState::Cancelled,
        ];

        for next in terminals {
            assert!(EntryState::Pending.can_transition_to(next));
        }

        // No transition out of a terminal state, and no self-transition.
        for from in terminals {
            assert!(!from.can_transition_to(EntryState::Approved));
            assert!(!from.can_transition_to(EntryState::Pending));
        }
        assert!(!EntryState::Pending.can_transition_to(EntryState::Pending));
    }

    #[test]
    fn decision_maps_to_matching_terminal_state() {
        assert_eq!(Decision::Approved.terminal_state(), EntryState::Approved);
        assert_eq!(Decision::Declined.terminal_state(), EntryState::Declined);
    }

    #[test]
    fn state_round_trips_through_string_form() {
        for state in [
            EntryState::Pending,
            EntryState::Approved,
            EntryState::Declined,
            EntryState::TimedOut,
            EntryState::Cancelled,
        ] {
            assert_eq!(state.as_str().parse::<EntryState>(), Ok(state));
        }
        assert!("ringing".parse::<EntryState>().is_err());
    }

    #[test]
    fn resolver_round_trips_through_string_form() {
        for by in [ResolvedBy::Resident, ResolvedBy::System, ResolvedBy::Guard] {
            assert_eq!(by.as_str().parse::<ResolvedBy>(), Ok(by));
        }
        assert!("janitor".parse::<ResolvedBy>().is_err());
    }
}
