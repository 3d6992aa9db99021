//! Gatepass domain core.
//!
//! Pure domain types for the visitor entry-approval workflow: entry states
//! and transition rules, visitor payloads, the error taxonomy, and the
//! per-category timeout policy. This crate has no I/O; persistence and
//! delivery live in `gatepass-db` and `gatepass-events`.

pub mod approval;
pub mod error;
pub mod timeouts;
pub mod types;
pub mod visitor;
