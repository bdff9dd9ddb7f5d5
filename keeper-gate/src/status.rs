//! The suspension check run on every inbound request.
//!
//! Each evaluation starts from [`GateState::Unknown`]; nothing is latched
//! between requests. Any failure to get a clear answer from the authority
//! resolves to [`GateState::Active`] so an unreachable authority never takes
//! the host down.

use crate::error::{GateError, GateResult};
use crate::page::{SuspensionView, render_suspension_page};
use crate::redirect::{clean_path, notice_from_query};
use crate::response::ShortCircuit;
use keeper_client::Authority;
use keeper_types::{ProjectInfo, RequestContext};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// States of a single gate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateState {
    Unknown,
    Checking,
    Active,
    Suspended(Suspension),
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            GateState::Unknown => "unknown",
            GateState::Checking => "checking",
            GateState::Active => "active",
            GateState::Suspended(_) => "suspended",
        };
        f.write_str(label)
    }
}

/// Details shown on the block page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Suspension {
    pub project_name: Option<String>,
    pub reason: Option<String>,
}

impl From<&ProjectInfo> for Suspension {
    fn from(info: &ProjectInfo) -> Self {
        Self {
            project_name: info.project_name.clone(),
            reason: info.suspended_reason.clone(),
        }
    }
}

/// What the host must do with the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Continue with normal host processing.
    Pass,
    /// Return this response and stop.
    ShortCircuit(ShortCircuit),
}

impl GateDecision {
    pub fn is_pass(&self) -> bool {
        matches!(self, GateDecision::Pass)
    }

    pub fn into_short_circuit(self) -> Option<ShortCircuit> {
        match self {
            GateDecision::Pass => None,
            GateDecision::ShortCircuit(response) => Some(response),
        }
    }
}

/// Looks up the project by domain and blocks suspended installations.
#[derive(Clone)]
pub struct StatusGate {
    authority: Arc<dyn Authority>,
    bound: Duration,
}

impl StatusGate {
    pub fn new(authority: Arc<dyn Authority>, bound: Duration) -> Self {
        Self { authority, bound }
    }

    /// Fetches the project record for `domain` within the gate's bound.
    pub(crate) async fn lookup(&self, domain: &str) -> GateResult<ProjectInfo> {
        let fetch = self.authority.project_info_by_domain(domain);
        match tokio::time::timeout(self.bound, fetch).await {
            Ok(Ok(Some(info))) => Ok(info),
            Ok(Ok(None)) => Err(GateError::NotFound(domain.to_string())),
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(GateError::Timeout(self.bound.as_millis() as u64)),
        }
    }

    /// Resolves the current state for `ctx`. Never returns `Unknown` or `Checking`.
    pub async fn check(&self, ctx: &RequestContext) -> GateState {
        debug!(domain = %ctx.domain, from = %GateState::Unknown, to = %GateState::Checking, "gate evaluation started");
        let state = match self.lookup(&ctx.domain).await {
            Ok(info) if info.is_active => GateState::Active,
            Ok(info) => GateState::Suspended(Suspension::from(&info)),
            Err(e) => {
                warn!(domain = %ctx.domain, error = %e, "status check failed, allowing request");
                GateState::Active
            }
        };
        debug!(domain = %ctx.domain, %state, "gate evaluation finished");
        state
    }

    /// Decides whether the request may proceed.
    pub async fn evaluate(&self, ctx: &RequestContext) -> GateDecision {
        match self.check(ctx).await {
            GateState::Suspended(suspension) => {
                warn!(domain = %ctx.domain, "project suspended, blocking request");
                GateDecision::ShortCircuit(block_page(ctx, &suspension))
            }
            _ => GateDecision::Pass,
        }
    }
}

/// Builds the 503 response for a suspended project.
pub fn block_page(ctx: &RequestContext, suspension: &Suspension) -> ShortCircuit {
    let view = SuspensionView {
        project_name: suspension.project_name.as_deref(),
        reason: suspension.reason.as_deref(),
        notice: notice_from_query(ctx.query()),
        form_action: clean_path(&ctx.request_uri),
    };
    ShortCircuit::service_unavailable(render_suspension_page(&view))
}
