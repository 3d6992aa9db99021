//! Gatepass entry-request coordinator.
//!
//! Owns the lifecycle of a visitor entry request from creation to its
//! single terminal resolution:
//!
//! - [`EntryCoordinator`] — create / resolve / cancel / timeout, status
//!   queries, and the bounded `await` used by long-polling guards.
//! - [`TimeoutScheduler`] — one deferred timeout task per pending request,
//!   with startup recovery from the store.
//! - [`ResolutionWaiters`] — per-request wake channels backing `await`
//!   without holding any lock across the suspension.

pub mod coordinator;
pub mod scheduler;
pub mod waiters;

pub use coordinator::EntryCoordinator;
pub use scheduler::TimeoutScheduler;
pub use waiters::ResolutionWaiters;
