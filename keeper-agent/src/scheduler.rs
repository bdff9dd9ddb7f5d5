//! Fixed-interval liveness hooks.

use crate::agent::Agent;
use keeper_types::RequestContext;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Drives heartbeats and last-seen updates for a long-running host.
pub struct Scheduler {
    agent: Arc<Agent>,
    ctx: RequestContext,
    heartbeat_every: Duration,
    last_seen_every: Duration,
}

impl Scheduler {
    /// Heartbeat every minute, last-seen every five minutes.
    pub fn new(agent: Arc<Agent>, ctx: RequestContext) -> Self {
        Self {
            agent,
            ctx,
            heartbeat_every: Duration::from_secs(60),
            last_seen_every: Duration::from_secs(300),
        }
    }

    pub fn with_periods(mut self, heartbeat_every: Duration, last_seen_every: Duration) -> Self {
        self.heartbeat_every = heartbeat_every;
        self.last_seen_every = last_seen_every;
        self
    }

    /// Minute hook: retries registration if needed, then beats.
    pub async fn every_minute(&self) {
        self.agent.boot(&self.ctx).await;
        self.agent.heartbeat(&self.ctx).await;
    }

    /// Five-minute hook.
    pub async fn every_five_minutes(&self) {
        self.agent.update_last_seen().await;
    }

    /// Runs both hooks until `shutdown` turns true or its sender is dropped.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        let mut heartbeat = tokio::time::interval(self.heartbeat_every);
        let mut last_seen = tokio::time::interval(self.last_seen_every);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        last_seen.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = heartbeat.tick() => self.every_minute().await,
                _ = last_seen.tick() => self.every_five_minutes().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
        info!("scheduler stopped");
    }
}
