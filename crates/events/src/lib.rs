//! Gatepass notification infrastructure.
//!
//! Building blocks for getting entry-request notifications out of the
//! coordinator and into the hands of guards and residents:
//!
//! - [`EventBus`] — in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`GateEvent`] — the canonical event envelope.
//! - [`Notification`] — an outbound message addressed to one party.
//! - [`NotificationDispatcher`] — at-least-once delivery with bounded
//!   exponential-backoff retry; exhaustion surfaces a delivery-failure
//!   event instead of touching request state.
//! - [`delivery`] — the push (HTTP POST) transport channel.

pub mod bus;
pub mod config;
pub mod delivery;
pub mod dispatcher;
pub mod message;

pub use bus::{EventBus, GateEvent};
pub use config::DispatchConfig;
pub use delivery::push::PushDelivery;
pub use dispatcher::NotificationDispatcher;
pub use message::{Notification, NotificationKind};
