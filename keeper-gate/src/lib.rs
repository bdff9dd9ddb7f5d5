//! Request-path enforcement for keeper.
//!
//! [`StatusGate`] blocks suspended installations with a 503 page,
//! [`ActivationHandler`] processes the reactivation form on that page, and
//! [`middleware::guard`] wires both into an axum router. Both return a
//! [`ShortCircuit`] when the host must stop processing the request.

mod activation;
mod error;
mod gatekeeper;
pub mod middleware;
mod page;
mod redirect;
mod response;
mod status;

pub use activation::{ACTIVATION_FIELD, ActivationHandler, ActivationOutcome, ActivationSubmission};
pub use error::{GateError, GateResult};
pub use gatekeeper::Gatekeeper;
pub use page::{
    DEFAULT_PROJECT_NAME, DEFAULT_SUSPENDED_REASON, SUCCESS_REDIRECT_SECS, SuspensionView,
    escape_html, render_success_page, render_suspension_page,
};
pub use redirect::{Notice, clean_path, clean_redirect, notice_from_query};
pub use response::{NO_CACHE_HEADERS, ShortCircuit};
pub use status::{GateDecision, GateState, StatusGate, Suspension, block_page};
