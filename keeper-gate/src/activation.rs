//! Handling of reactivation-code submissions from the block page.

use crate::error::GateError;
use crate::page::render_success_page;
use crate::redirect::{Notice, clean_redirect};
use crate::response::ShortCircuit;
use crate::status::StatusGate;
use keeper_client::{ActivationCheck, Authority};
use keeper_types::RequestContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Form field carrying the candidate code.
pub const ACTIVATION_FIELD: &str = "activation_code";

/// A reactivation form submission.
#[derive(Clone, PartialEq, Eq)]
pub struct ActivationSubmission {
    code: String,
}

impl std::fmt::Debug for ActivationSubmission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivationSubmission")
            .field("code", &"[REDACTED]")
            .finish()
    }
}

impl ActivationSubmission {
    pub fn new(code: impl Into<String>) -> Self {
        Self { code: code.into() }
    }

    /// Extracts the submission from an `application/x-www-form-urlencoded` body.
    /// `None` when the body has no `activation_code` field.
    pub fn from_form(body: &[u8]) -> Option<Self> {
        url::form_urlencoded::parse(body)
            .find(|(k, _)| k == ACTIVATION_FIELD)
            .map(|(_, v)| Self::new(v.into_owned()))
    }

    /// The submitted code with surrounding whitespace removed.
    pub fn code(&self) -> &str {
        self.code.trim()
    }
}

/// Result of processing a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationOutcome {
    MissingCode,
    ConnectionFailed,
    ProjectNotFound,
    InvalidCode,
    ReactivationFailed,
    Reactivated,
}

impl ActivationOutcome {
    /// Message shown to the person who submitted the form.
    pub fn message(self) -> &'static str {
        match self {
            ActivationOutcome::MissingCode => "Please enter the activation code",
            ActivationOutcome::ConnectionFailed => "Connection to the control server failed",
            ActivationOutcome::ProjectNotFound => "Project not found",
            ActivationOutcome::InvalidCode => "Invalid activation code",
            ActivationOutcome::ReactivationFailed => "Reactivation failed",
            ActivationOutcome::Reactivated => "Project reactivated successfully",
        }
    }

    fn notice(self) -> Notice {
        match self {
            ActivationOutcome::Reactivated => Notice::success(self.message()),
            _ => Notice::error(self.message()),
        }
    }
}

/// Verifies a submitted code and reactivates the project.
#[derive(Clone)]
pub struct ActivationHandler {
    authority: Arc<dyn Authority>,
    lookup: StatusGate,
    bound: Duration,
}

impl ActivationHandler {
    /// `lookup_bound` caps the project lookup, `bound` the reactivation call.
    pub fn new(authority: Arc<dyn Authority>, lookup_bound: Duration, bound: Duration) -> Self {
        Self {
            lookup: StatusGate::new(Arc::clone(&authority), lookup_bound),
            authority,
            bound,
        }
    }

    /// Runs the lookup / compare / reactivate sequence for `domain`.
    pub async fn submit(&self, domain: &str, submission: &ActivationSubmission) -> ActivationOutcome {
        let code = submission.code();
        if code.is_empty() {
            return ActivationOutcome::MissingCode;
        }

        let info = match self.lookup.lookup(domain).await {
            Ok(info) => info,
            Err(GateError::NotFound(_)) => return ActivationOutcome::ProjectNotFound,
            Err(e) => {
                warn!(domain = %domain, error = %e, "activation lookup failed");
                return ActivationOutcome::ConnectionFailed;
            }
        };

        if info.activation_code.as_deref() != Some(code) {
            info!(domain = %domain, project_id = %info.id, "activation code rejected");
            return ActivationOutcome::InvalidCode;
        }

        match tokio::time::timeout(self.bound, self.authority.reactivate(&info.id)).await {
            Ok(Ok(())) => {
                info!(domain = %domain, project_id = %info.id, "project reactivated");
                ActivationOutcome::Reactivated
            }
            Ok(Err(e)) => {
                warn!(project_id = %info.id, error = %e, "reactivation failed");
                ActivationOutcome::ReactivationFailed
            }
            Err(_) => {
                warn!(project_id = %info.id, "reactivation timed out");
                ActivationOutcome::ReactivationFailed
            }
        }
    }

    /// Processes the submission and returns the response that ends the request.
    pub async fn handle(&self, ctx: &RequestContext, submission: &ActivationSubmission) -> ShortCircuit {
        let outcome = self.submit(&ctx.domain, submission).await;
        let target = clean_redirect(&ctx.request_uri, &outcome.notice());
        match outcome {
            ActivationOutcome::Reactivated => {
                ShortCircuit::page(render_success_page(outcome.message(), &target))
            }
            _ => ShortCircuit::see_other(target),
        }
    }

    /// Asks the authority whether `code` is valid for `domain`.
    ///
    /// Any failure is reported as an invalid code.
    pub async fn validate_code(&self, domain: &str, code: &str) -> ActivationCheck {
        let check = self.authority.check_project_status(domain, code.trim());
        match tokio::time::timeout(self.bound, check).await {
            Ok(Ok(check)) => check,
            Ok(Err(e)) => {
                warn!(domain = %domain, error = %e, "activation check failed");
                ActivationCheck {
                    valid: false,
                    is_active: false,
                }
            }
            Err(_) => {
                warn!(domain = %domain, "activation check timed out");
                ActivationCheck {
                    valid: false,
                    is_active: false,
                }
            }
        }
    }
}
