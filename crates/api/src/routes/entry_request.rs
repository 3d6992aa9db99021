//! Route definitions for the entry-request lifecycle.
//!
//! ```text
//! POST   /                  create_entry_request
//! GET    /{id}              get_status
//! GET    /{id}/await        await_resolution
//! POST   /{id}/respond      respond
//! POST   /{id}/cancel       cancel
//! ```

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::entry_request;
use crate::state::AppState;

/// Entry-request routes, nested under `/entry-requests`.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(entry_request::create_entry_request))
        .route("/{id}", get(entry_request::get_status))
        .route("/{id}/await", get(entry_request::await_resolution))
        .route("/{id}/respond", post(entry_request::respond))
        .route("/{id}/cancel", post(entry_request::cancel))
}
