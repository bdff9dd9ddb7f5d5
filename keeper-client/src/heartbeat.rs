//! Fire-and-forget liveness reporting.

use crate::api::Authority;
use crate::error::ClientError;
use crate::memory::MemorySample;
use crate::payload::{HeartbeatPayload, LastSeenPayload};
use keeper_types::{ProjectCredentials, SystemInfo};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Sends heartbeats and last-seen updates, never failing the caller.
#[derive(Clone)]
pub struct HeartbeatEmitter {
    authority: Arc<dyn Authority>,
    bound: Duration,
}

impl HeartbeatEmitter {
    /// `bound` caps how long any single call may hold up the caller.
    pub fn new(authority: Arc<dyn Authority>, bound: Duration) -> Self {
        Self { authority, bound }
    }

    pub fn bound(&self) -> Duration {
        self.bound
    }

    /// Reports liveness and memory figures. A no-op without credentials.
    pub async fn beat(&self, credentials: Option<&ProjectCredentials>, system: &SystemInfo) {
        let Some(credentials) = credentials else {
            return;
        };
        let payload = HeartbeatPayload::new(credentials, system, MemorySample::current());
        self.bounded("heartbeat", self.authority.heartbeat(&payload)).await;
    }

    /// Records that the installation was seen just now. A no-op without credentials.
    pub async fn update_last_seen(&self, credentials: Option<&ProjectCredentials>) {
        let Some(credentials) = credentials else {
            return;
        };
        let payload = LastSeenPayload::new(credentials);
        self.bounded("last-seen", self.authority.update_last_seen(&payload))
            .await;
    }

    async fn bounded<F>(&self, call: &'static str, fut: F)
    where
        F: Future<Output = Result<(), ClientError>>,
    {
        match tokio::time::timeout(self.bound, fut).await {
            Ok(Ok(())) => debug!(call, "liveness update sent"),
            Ok(Err(e)) => debug!(call, error = %e, "liveness update failed"),
            Err(_) => debug!(call, bound_ms = self.bound.as_millis() as u64, "liveness update timed out"),
        }
    }
}
