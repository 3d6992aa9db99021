//! Integration tests for the `/entry-requests` endpoints.
//!
//! These run the full middleware stack over the in-memory store; nothing
//! external is required.

mod common;

use std::time::Duration;

use axum::http::StatusCode;
use axum::Router;
use common::{body_json, get, post_json, GUARD, RESIDENT};
use serde_json::json;

fn visitor_body() -> serde_json::Value {
    json!({
        "guard_id": GUARD,
        "resident_id": RESIDENT,
        "visitor": {
            "name": "Asha Rao",
            "category": "guest"
        }
    })
}

/// Create a request through the API and return its id.
async fn create_request(app: Router) -> String {
    let response = post_json(app, "/api/v1/entry-requests", visitor_body()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    json["data"]["id"].as_str().unwrap().to_string()
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_returns_pending_record() {
    let (app, _) = common::build_test_app();

    let response = post_json(app, "/api/v1/entry-requests", visitor_body()).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = &json["data"];
    assert!(data["id"].as_str().unwrap().parse::<uuid::Uuid>().is_ok());
    assert_eq!(data["state"], "pending");
    assert_eq!(data["guard_id"], GUARD);
    assert_eq!(data["resident_id"], RESIDENT);
    assert_eq!(data["visitor"]["name"], "Asha Rao");
    assert!(data["expires_at"].is_string());
    assert!(data["resolved_at"].is_null());
}

#[tokio::test]
async fn create_rejects_blank_visitor_name() {
    let (app, _) = common::build_test_app();

    let body = json!({
        "guard_id": GUARD,
        "resident_id": RESIDENT,
        "visitor": { "name": "   ", "category": "guest" }
    });
    let response = post_json(app, "/api/v1/entry-requests", body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["code"], "INVALID_VISITOR_PAYLOAD");
}

#[tokio::test]
async fn create_rejects_unknown_resident() {
    let (app, _) = common::build_test_app();

    let body = json!({
        "guard_id": GUARD,
        "resident_id": "resident-404",
        "visitor": { "name": "Asha Rao", "category": "guest" }
    });
    let response = post_json(app, "/api/v1/entry-requests", body).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let json = body_json(response).await;
    assert_eq!(json["code"], "UNKNOWN_RESIDENT");
}

#[tokio::test]
async fn create_rejects_malformed_body() {
    let (app, _) = common::build_test_app();

    let response = post_json(app, "/api/v1/entry-requests", json!({ "guard_id": GUARD })).await;
    assert!(response.status().is_client_error());
}

// ---------------------------------------------------------------------------
// Decisions
// ---------------------------------------------------------------------------

#[tokio::test]
async fn resident_decision_resolves_the_request() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/entry-requests/{id}/respond"),
        json!({ "resident_id": RESIDENT, "decision": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "approved");
    assert_eq!(json["data"]["resolved_by"], "resident");

    // The status query agrees.
    let response = get(app, &format!("/api/v1/entry-requests/{id}")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "approved");
}

#[tokio::test]
async fn decline_resolves_the_request() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let response = post_json(
        app,
        &format!("/api/v1/entry-requests/{id}/respond"),
        json!({ "resident_id": RESIDENT, "decision": "declined" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "declined");
}

#[tokio::test]
async fn wrong_resident_cannot_respond() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/entry-requests/{id}/respond"),
        json!({ "resident_id": "resident-2", "decision": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let json = body_json(response).await;
    assert_eq!(json["code"], "FORBIDDEN");

    // The rejected attempt must not change the request.
    let response = get(app, &format!("/api/v1/entry-requests/{id}")).await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "pending");
}

// ---------------------------------------------------------------------------
// Cancellation and conflicts
// ---------------------------------------------------------------------------

#[tokio::test]
async fn guard_can_cancel_a_pending_request() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let response = post_json(
        app,
        &format!("/api/v1/entry-requests/{id}/cancel"),
        json!({ "guard_id": GUARD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "cancelled");
    assert_eq!(json["data"]["resolved_by"], "guard");
}

#[tokio::test]
async fn wrong_guard_cannot_cancel() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let response = post_json(
        app,
        &format!("/api/v1/entry-requests/{id}/cancel"),
        json!({ "guard_id": "guard-2" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn respond_after_cancel_conflicts_with_actual_resolution() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let response = post_json(
        app.clone(),
        &format!("/api/v1/entry-requests/{id}/cancel"),
        json!({ "guard_id": GUARD }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = post_json(
        app,
        &format!("/api/v1/entry-requests/{id}/respond"),
        json!({ "resident_id": RESIDENT, "decision": "approved" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // The conflict body carries what actually happened.
    let json = body_json(response).await;
    assert_eq!(json["code"], "ALREADY_RESOLVED");
    assert_eq!(json["resolution"]["state"], "cancelled");
    assert_eq!(json["resolution"]["resolved_by"], "guard");
    assert!(json["resolution"]["resolved_at"].is_string());
}

// ---------------------------------------------------------------------------
// Status and await
// ---------------------------------------------------------------------------

#[tokio::test]
async fn status_of_unknown_request_is_404() {
    let (app, _) = common::build_test_app();
    let id = uuid::Uuid::new_v4();

    let response = get(app, &format!("/api/v1/entry-requests/{id}")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn await_returns_pending_once_the_bound_elapses() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let response = get(
        app,
        &format!("/api/v1/entry-requests/{id}/await?max_wait_ms=100"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "pending");
    assert!(json["data"]["resolved_at"].is_null());
}

#[tokio::test]
async fn await_wakes_when_the_decision_arrives() {
    let (app, _) = common::build_test_app();
    let id = create_request(app.clone()).await;

    let responder = {
        let app = app.clone();
        let id = id.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            post_json(
                app,
                &format!("/api/v1/entry-requests/{id}/respond"),
                json!({ "resident_id": RESIDENT, "decision": "approved" }),
            )
            .await
        })
    };

    let response = get(
        app,
        &format!("/api/v1/entry-requests/{id}/await?max_wait_ms=5000"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["state"], "approved");
    assert_eq!(json["data"]["resolved_by"], "resident");

    let respond = responder.await.unwrap();
    assert_eq!(respond.status(), StatusCode::OK);
}

#[tokio::test]
async fn await_on_unknown_request_is_404() {
    let (app, _) = common::build_test_app();
    let id = uuid::Uuid::new_v4();

    let response = get(
        app,
        &format!("/api/v1/entry-requests/{id}/await?max_wait_ms=100"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
