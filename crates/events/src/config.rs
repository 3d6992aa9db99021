//! Dispatcher configuration.

use std::time::Duration;

/// Retry and transport settings for the notification dispatcher.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Total delivery attempts per notification (first try included).
    pub max_attempts: u32,
    /// Backoff before retry `n` is `base * 2^n` plus jitter.
    pub base_backoff: Duration,
    /// External push gateway endpoint. When unset, notifications are
    /// published on the in-process event bus instead.
    pub push_gateway_url: Option<String>,
}

impl DispatchConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                   | Default |
    /// |---------------------------|---------|
    /// | `DISPATCH_MAX_ATTEMPTS`   | `4`     |
    /// | `DISPATCH_BASE_BACKOFF_MS`| `500`   |
    /// | `PUSH_GATEWAY_URL`        | unset   |
    pub fn from_env() -> Self {
        let max_attempts: u32 = std::env::var("DISPATCH_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("DISPATCH_MAX_ATTEMPTS must be a valid u32");

        let base_backoff_ms: u64 = std::env::var("DISPATCH_BASE_BACKOFF_MS")
            .unwrap_or_else(|_| "500".into())
            .parse()
            .expect("DISPATCH_BASE_BACKOFF_MS must be a valid u64");

        let push_gateway_url = std::env::var("PUSH_GATEWAY_URL")
            .ok()
            .filter(|s| !s.trim().is_empty());

        Self {
            max_attempts,
            base_backoff: Duration::from_millis(base_backoff_ms),
            push_gateway_url,
        }
    }

    /// Backoff to sleep after failed attempt `attempt` (zero-based),
    /// with up to 25% random jitter to avoid thundering retries.
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        use rand::Rng;

        let base_ms = self.base_backoff.as_millis() as u64;
        let exp = base_ms.saturating_mul(1u64 << attempt.min(16));
        let jitter = rand::rng().random_range(0..=exp / 4);
        Duration::from_millis(exp + jitter)
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_backoff: Duration::from_millis(500),
            push_gateway_url: None,
        }
    }
}
