//! Push delivery over HTTP POST.
//!
//! [`PushDelivery`] sends a JSON-encoded [`Notification`] to the configured
//! push gateway. One call is one attempt; the retry loop lives in the
//! [`NotificationDispatcher`](crate::dispatcher::NotificationDispatcher).

use std::time::Duration;

use crate::message::Notification;

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for push delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum PushError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The gateway returned a non-2xx status code.
    #[error("Push gateway returned HTTP {0}")]
    HttpStatus(u16),
}

// ---------------------------------------------------------------------------
// PushDelivery
// ---------------------------------------------------------------------------

/// Delivers notifications to an external push gateway.
pub struct PushDelivery {
    client: reqwest::Client,
    gateway_url: String,
}

impl PushDelivery {
    /// Create a delivery channel pointed at `gateway_url`.
    pub fn new(gateway_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            gateway_url: gateway_url.into(),
        }
    }

    /// Execute a single POST attempt and check the response status.
    pub async fn send(&self, notification: &Notification) -> Result<(), PushError> {
        let payload = serde_json::json!({
            "kind": notification.kind.as_str(),
            "target": notification.target,
            "request_id": notification.request_id,
            "state": notification.state,
            "body": notification.body,
            "created_at": notification.created_at,
        });

        let response = self
            .client
            .post(&self.gateway_url)
            .json(&payload)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(PushError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
