//! Per-category approval timeout policy.
//!
//! The approval window is configuration, not a per-request constant. A
//! single default applies to every category unless overridden.

use std::time::Duration;

use crate::visitor::VisitorCategory;

/// Default approval window when no override is configured.
const DEFAULT_TIMEOUT_SECS: u64 = 45;

/// How long a resident has to answer, by visitor category.
#[derive(Debug, Clone)]
pub struct TimeoutPolicy {
    /// Fallback window for categories without an override.
    pub default: Duration,
    pub guest: Option<Duration>,
    pub cab: Option<Duration>,
    pub delivery: Option<Duration>,
    pub serviceman: Option<Duration>,
}

impl TimeoutPolicy {
    /// Load the policy from environment variables.
    ///
    /// | Env Var                        | Default       |
    /// |--------------------------------|---------------|
    /// | `ENTRY_TIMEOUT_SECS`           | `45`          |
    /// | `ENTRY_TIMEOUT_GUEST_SECS`     | unset         |
    /// | `ENTRY_TIMEOUT_CAB_SECS`       | unset         |
    /// | `ENTRY_TIMEOUT_DELIVERY_SECS`  | unset         |
    /// | `ENTRY_TIMEOUT_SERVICEMAN_SECS`| unset         |
    pub fn from_env() -> Self {
        Self {
            default: env_secs("ENTRY_TIMEOUT_SECS")
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            guest: env_secs("ENTRY_TIMEOUT_GUEST_SECS"),
            cab: env_secs("ENTRY_TIMEOUT_CAB_SECS"),
            delivery: env_secs("ENTRY_TIMEOUT_DELIVERY_SECS"),
            serviceman: env_secs("ENTRY_TIMEOUT_SERVICEMAN_SECS"),
        }
    }

    /// The approval window for a given visitor category.
    pub fn duration_for(&self, category: VisitorCategory) -> Duration {
        let specific = match category {
            VisitorCategory::Guest => self.guest,
            VisitorCategory::Cab => self.cab,
            VisitorCategory::Delivery => self.delivery,
            VisitorCategory::Serviceman => self.serviceman,
        };
        specific.unwrap_or(self.default)
    }
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            default: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            guest: None,
            cab: None,
            delivery: None,
            serviceman: None,
        }
    }
}

/// Read a duration in whole seconds from an environment variable.
///
/// Unset, empty, or unparsable values yield `None`.
fn env_secs(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
