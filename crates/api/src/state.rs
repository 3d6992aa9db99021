use std::sync::Arc;

use gatepass_approval::EntryCoordinator;
use gatepass_events::EventBus;

use crate::config::ServerConfig;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// The entry-request coordinator, owner of all request lifecycles.
    pub coordinator: Arc<EntryCoordinator>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Centralized event bus for publishing lifecycle events.
    pub event_bus: Arc<EventBus>,
}
