//! Remote authority client configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default base URL of the remote authority API.
pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000/api";

/// Classes of remote calls, each with its own deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallClass {
    /// Project creation and conflict lookup.
    Registration,
    /// Status gate lookups on the request path.
    Status,
    /// Activation-code validation and reactivation.
    Activation,
    /// Heartbeat, last-seen and configuration sync.
    Liveness,
}

/// Connection settings for the remote authority.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL, without a trailing slash (e.g. `https://authority.example/api`).
    pub base_url: String,
    /// `User-Agent` sent with every request.
    pub user_agent: String,
    pub registration_timeout_ms: u64,
    pub status_timeout_ms: u64,
    pub activation_timeout_ms: u64,
    pub heartbeat_timeout_ms: u64,
    /// Client-wide ceiling; no call may exceed it.
    pub request_ceiling_ms: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: format!("keeper-agent/{}", env!("CARGO_PKG_VERSION")),
            registration_timeout_ms: 10_000,
            status_timeout_ms: 5_000,
            activation_timeout_ms: 15_000,
            heartbeat_timeout_ms: 5_000,
            request_ceiling_ms: 30_000,
        }
    }
}

impl ClientConfig {
    /// Config pointing at `base_url` with default timeouts.
    #[must_use]
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Deadline for a call of the given class, capped by the ceiling.
    #[must_use]
    pub fn timeout(&self, class: CallClass) -> Duration {
        let ms = match class {
            CallClass::Registration => self.registration_timeout_ms,
            CallClass::Status => self.status_timeout_ms,
            CallClass::Activation => self.activation_timeout_ms,
            CallClass::Liveness => self.heartbeat_timeout_ms,
        };
        Duration::from_millis(ms.min(self.request_ceiling_ms))
    }

    /// Client-wide ceiling.
    #[must_use]
    pub fn ceiling(&self) -> Duration {
        Duration::from_millis(self.request_ceiling_ms)
    }

    /// Joins an endpoint path onto the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}
