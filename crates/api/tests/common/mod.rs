#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use gatepass_api::config::ServerConfig;
use gatepass_api::router::build_app_router;
use gatepass_api::state::AppState;
use gatepass_approval::EntryCoordinator;
use gatepass_core::timeouts::TimeoutPolicy;
use gatepass_db::{EntryStore, MemoryStore};
use gatepass_events::{DispatchConfig, EventBus, NotificationDispatcher};

/// Guard id pre-registered in every test app.
pub const GUARD: &str = "guard-1";

/// Resident id pre-registered in every test app.
pub const RESIDENT: &str = "resident-1";

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        await_max_wait_ms: 5_000,
    }
}

/// Build the full application router over an in-memory store.
///
/// This mirrors the router construction in `main.rs` so integration tests
/// exercise the same middleware stack (CORS, request ID, timeout, tracing,
/// panic recovery) that production uses. The store comes back too so tests
/// can seed or inspect records directly.
pub fn build_test_app() -> (Router, Arc<MemoryStore>) {
    let config = test_config();
    let store = Arc::new(MemoryStore::with_residents([RESIDENT]));
    let event_bus = Arc::new(EventBus::default());

    let dispatcher = Arc::new(NotificationDispatcher::new(
        Arc::clone(&store) as Arc<dyn EntryStore>,
        Arc::clone(&event_bus),
        DispatchConfig::default(),
    ));
    let coordinator = EntryCoordinator::new(
        Arc::clone(&store) as Arc<dyn EntryStore>,
        Arc::clone(&event_bus),
        dispatcher,
        TimeoutPolicy::default(),
    );

    let state = AppState {
        coordinator,
        config: Arc::new(config.clone()),
        event_bus,
    };

    (build_app_router(state, &config), store)
}

/// Send a GET request to the app and return the raw response.
pub async fn get(app: Router, uri: &str) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::GET)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Send a POST request with a JSON body and return the raw response.
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    app.oneshot(
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("response body should be valid JSON")
}
