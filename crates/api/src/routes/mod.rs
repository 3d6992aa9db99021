pub mod entry_request;
pub mod health;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /entry-requests                       create
/// /entry-requests/{id}                  get status
/// /entry-requests/{id}/await            long-poll for resolution
/// /entry-requests/{id}/respond          resident decision
/// /entry-requests/{id}/cancel           guard withdrawal
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/entry-requests", entry_request::router())
}
