//! Handlers for the `/entry-requests` resource.
//!
//! Callers identify themselves by id in the request body; the coordinator
//! checks that the actor matches the party on the record and answers
//! `403 FORBIDDEN` otherwise.

use std::time::Duration;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use gatepass_core::approval::Decision;
use gatepass_core::types::RequestId;
use gatepass_core::visitor::VisitorPayload;
use gatepass_db::models::{EntryRequest, StatusView};

use crate::error::AppResult;
use crate::response::DataResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

/// Body for `POST /entry-requests`.
#[derive(Debug, Deserialize)]
pub struct CreateEntryRequest {
    /// The guard raising the request at the gate.
    pub guard_id: String,
    /// The resident who must answer it.
    pub resident_id: String,
    /// Visitor details captured at the gate.
    pub visitor: VisitorPayload,
}

/// Body for `POST /entry-requests/{id}/respond`.
#[derive(Debug, Deserialize)]
pub struct RespondRequest {
    /// The resident answering; must match the request's resident.
    pub resident_id: String,
    pub decision: Decision,
}

/// Body for `POST /entry-requests/{id}/cancel`.
#[derive(Debug, Deserialize)]
pub struct CancelRequest {
    /// The guard withdrawing; must match the request's guard.
    pub guard_id: String,
}

/// Query parameters for `GET /entry-requests/{id}/await`.
#[derive(Debug, Deserialize)]
pub struct AwaitQuery {
    /// How long to wait for a resolution, in milliseconds. Defaults to the
    /// configured cap and is clamped to it.
    pub max_wait_ms: Option<u64>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /api/v1/entry-requests
///
/// Create a pending entry request and notify the resident. Returns 201
/// with the full record, including the id callers track from here on.
pub async fn create_entry_request(
    State(state): State<AppState>,
    Json(body): Json<CreateEntryRequest>,
) -> AppResult<(StatusCode, Json<DataResponse<EntryRequest>>)> {
    let request = state
        .coordinator
        .create(&body.guard_id, &body.resident_id, body.visitor)
        .await?;

    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/entry-requests/{id}
///
/// Current status of a request. Safe to poll at any time.
pub async fn get_status(
    State(state): State<AppState>,
    Path(id): Path<RequestId>,
) -> AppResult<Json<DataResponse<StatusView>>> {
    let status = state.coordinator.get_status(id).await?;

    Ok(Json(DataResponse { data: status }))
}

/// GET /api/v1/entry-requests/{id}/await
///
/// Long-poll for the request's resolution. Returns as soon as the request
/// leaves `Pending`, or with the current (still pending) status once the
/// wait bound elapses. The wait bound never alters request state.
pub async fn await_resolution(
    State(state): State<AppState>,
    Path(id): Path<RequestId>,
    Query(params): Query<AwaitQuery>,
) -> AppResult<Json<DataResponse<StatusView>>> {
    let cap = state.config.await_max_wait_ms;
    let wait_ms = params.max_wait_ms.unwrap_or(cap).min(cap);

    let status = state
        .coordinator
        .await_resolution(id, Duration::from_millis(wait_ms))
        .await?;

    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/entry-requests/{id}/respond
///
/// Apply the resident's decision. Answers 409 with the actual resolution
/// if the request already reached a terminal state.
pub async fn respond(
    State(state): State<AppState>,
    Path(id): Path<RequestId>,
    Json(body): Json<RespondRequest>,
) -> AppResult<Json<DataResponse<StatusView>>> {
    state
        .coordinator
        .resolve(id, &body.resident_id, body.decision)
        .await?;

    let status = state.coordinator.get_status(id).await?;
    Ok(Json(DataResponse { data: status }))
}

/// POST /api/v1/entry-requests/{id}/cancel
///
/// Withdraw a still-pending request. Answers 409 with the actual
/// resolution if a decision or timeout got there first.
pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<RequestId>,
    Json(body): Json<CancelRequest>,
) -> AppResult<Json<DataResponse<StatusView>>> {
    state.coordinator.cancel(id, &body.guard_id).await?;

    let status = state.coordinator.get_status(id).await?;
    Ok(Json(DataResponse { data: status }))
}
