//! keeper licensing agent.
//!
//! Embeds in a host HTTP application to give the installation a stable
//! identity, register it with the remote authority, report liveness, and
//! block traffic while the authority marks the project suspended.
//!
//! ```ignore
//! let agent = Arc::new(Agent::new(AgentConfig::discover(root, IdentityStrategy::Deterministic))?);
//! let app = keeper_agent::router_layer(Router::new().route("/", get(home)), agent);
//! ```

mod agent;
mod config;
mod error;
mod scheduler;

pub use agent::Agent;
pub use config::{AgentConfig, BASE_URL_VAR, PROJECT_ROOT_VAR};
pub use error::{AgentError, AgentResult};
pub use scheduler::Scheduler;

use async_trait::async_trait;
use axum::Router;
use keeper_gate::middleware::{GuardState, RequestHook, protect};
use keeper_types::RequestContext;
use std::sync::Arc;

/// Boots the agent before the gate and records a last-seen for passing requests.
struct AgentHook(Arc<Agent>);

#[async_trait]
impl RequestHook for AgentHook {
    async fn before_gate(&self, ctx: &RequestContext) {
        self.0.boot(ctx).await;
    }

    fn after_pass(&self, _ctx: &RequestContext) {
        let agent = Arc::clone(&self.0);
        tokio::spawn(async move {
            agent.update_last_seen().await;
        });
    }
}

/// Puts the gate in front of every route of `router`.
pub fn router_layer<S>(router: Router<S>, agent: Arc<Agent>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let state = GuardState::new(agent.gatekeeper().clone()).with_hook(Arc::new(AgentHook(agent)));
    protect(router, state)
}
