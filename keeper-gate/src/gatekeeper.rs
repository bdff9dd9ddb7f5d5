//! Combines the status gate and the activation handler.

use crate::activation::{ActivationHandler, ActivationSubmission};
use crate::status::{GateDecision, StatusGate};
use keeper_client::{Authority, CallClass, ClientConfig};
use keeper_types::RequestContext;
use std::sync::Arc;

/// Per-request interception: activation submissions first, then the status check.
#[derive(Clone)]
pub struct Gatekeeper {
    gate: StatusGate,
    activation: ActivationHandler,
}

impl Gatekeeper {
    pub fn new(gate: StatusGate, activation: ActivationHandler) -> Self {
        Self { gate, activation }
    }

    /// Builds both halves with the deadlines from `config`.
    pub fn from_config(authority: Arc<dyn Authority>, config: &ClientConfig) -> Self {
        let status = config.timeout(CallClass::Status);
        Self {
            gate: StatusGate::new(Arc::clone(&authority), status),
            activation: ActivationHandler::new(authority, status, config.timeout(CallClass::Activation)),
        }
    }

    pub fn gate(&self) -> &StatusGate {
        &self.gate
    }

    pub fn activation(&self) -> &ActivationHandler {
        &self.activation
    }

    /// A submission always ends the request; otherwise the status gate decides.
    pub async fn intercept(
        &self,
        ctx: &RequestContext,
        submission: Option<&ActivationSubmission>,
    ) -> GateDecision {
        match submission {
            Some(submission) => {
                GateDecision::ShortCircuit(self.activation.handle(ctx, submission).await)
            }
            None => self.gate.evaluate(ctx).await,
        }
    }
}
