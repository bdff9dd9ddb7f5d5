//! axum integration.
//!
//! [`guard`] runs before routing. A short-circuit is returned directly and the
//! inner service is never called.

use crate::activation::ActivationSubmission;
use crate::gatekeeper::Gatekeeper;
use crate::response::ShortCircuit;
use crate::status::GateDecision;
use async_trait::async_trait;
use axum::Router;
use axum::body::{Body, to_bytes};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{HeaderName, HeaderValue, Method, StatusCode, header};
use axum::middleware::{Next, from_fn_with_state};
use axum::response::{IntoResponse, Response};
use keeper_types::RequestContext;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::warn;

/// Largest form body inspected for an activation code.
const MAX_FORM_BYTES: usize = 64 * 1024;

/// Callbacks around the gate, used by the agent for registration and liveness.
#[async_trait]
pub trait RequestHook: Send + Sync {
    /// Runs before the gate on every request.
    async fn before_gate(&self, _ctx: &RequestContext) {}

    /// Runs when a request is allowed through. Must not block.
    fn after_pass(&self, _ctx: &RequestContext) {}
}

/// State shared by every invocation of [`guard`].
#[derive(Clone)]
pub struct GuardState {
    gatekeeper: Arc<Gatekeeper>,
    hook: Option<Arc<dyn RequestHook>>,
}

impl GuardState {
    pub fn new(gatekeeper: Gatekeeper) -> Self {
        Self {
            gatekeeper: Arc::new(gatekeeper),
            hook: None,
        }
    }

    pub fn with_hook(mut self, hook: Arc<dyn RequestHook>) -> Self {
        self.hook = Some(hook);
        self
    }
}

/// Installs [`guard`] in front of every route of `router`.
pub fn protect<S>(router: Router<S>, state: GuardState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.layer(from_fn_with_state(state, guard))
}

/// Gate middleware for `axum::middleware::from_fn_with_state`.
pub async fn guard(State(state): State<GuardState>, req: Request, next: Next) -> Response {
    let ctx = request_context(&req);
    if let Some(hook) = &state.hook {
        hook.before_gate(&ctx).await;
    }

    let (req, submission) = split_submission(req).await;
    match state.gatekeeper.intercept(&ctx, submission.as_ref()).await {
        GateDecision::Pass => {
            if let Some(hook) = &state.hook {
                hook.after_pass(&ctx);
            }
            next.run(req).await
        }
        GateDecision::ShortCircuit(response) => response.into_response(),
    }
}

/// Builds the per-request context from an axum request.
pub fn request_context(req: &Request) -> RequestContext {
    let (domain, port) = req
        .headers()
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(split_host)
        .or_else(|| {
            req.uri()
                .host()
                .map(|h| (h.to_ascii_lowercase(), req.uri().port_u16()))
        })
        .unwrap_or_else(|| ("localhost".to_string(), None));

    let header_str = |name: HeaderName| {
        req.headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    RequestContext {
        domain,
        port,
        remote_addr: req
            .extensions()
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string()),
        user_agent: header_str(header::USER_AGENT),
        request_uri: req
            .uri()
            .path_and_query()
            .map_or_else(|| "/".to_string(), |pq| pq.as_str().to_string()),
        method: req.method().as_str().to_string(),
        server_name: None,
        server_software: None,
        protocol: format!("{:?}", req.version()),
    }
}

/// Splits a `Host` header value into lower-cased host and optional port.
fn split_host(host: &str) -> (String, Option<u16>) {
    let host = host.trim();
    if host.starts_with('[') {
        if let Some(end) = host.find(']') {
            let port = host[end + 1..].strip_prefix(':').and_then(|p| p.parse().ok());
            return (host[..=end].to_ascii_lowercase(), port);
        }
    }
    match host.rsplit_once(':') {
        Some((name, port)) => match port.parse() {
            Ok(port) => (name.to_ascii_lowercase(), Some(port)),
            Err(_) => (host.to_ascii_lowercase(), None),
        },
        None => (host.to_ascii_lowercase(), None),
    }
}

fn is_form(req: &Request) -> bool {
    req.headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| {
            ct.trim_start()
                .to_ascii_lowercase()
                .starts_with("application/x-www-form-urlencoded")
        })
}

/// Declared body length, if the request carries a valid `Content-Length`.
fn content_length(req: &Request) -> Option<usize> {
    req.headers()
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

/// Reads an activation submission out of a form POST, handing back a request
/// whose body is intact for the inner service.
///
/// Only bodies with a declared length of at most [`MAX_FORM_BYTES`] are
/// inspected; anything else goes to the host untouched.
async fn split_submission(req: Request) -> (Request, Option<ActivationSubmission>) {
    if req.method() != Method::POST || !is_form(&req) {
        return (req, None);
    }
    if !content_length(&req).is_some_and(|len| len <= MAX_FORM_BYTES) {
        return (req, None);
    }
    let (parts, body) = req.into_parts();
    match to_bytes(body, MAX_FORM_BYTES).await {
        Ok(bytes) => {
            let submission = ActivationSubmission::from_form(&bytes);
            (Request::from_parts(parts, Body::from(bytes)), submission)
        }
        Err(e) => {
            warn!(error = %e, "could not read form body");
            (Request::from_parts(parts, Body::empty()), None)
        }
    }
}

impl IntoResponse for ShortCircuit {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body));
        *response.status_mut() =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::SERVICE_UNAVAILABLE);
        for (name, value) in self.headers {
            if let Ok(value) = HeaderValue::from_str(&value) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(name), value);
            }
        }
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_host_handles_ports_and_ipv6() {
        assert_eq!(split_host("Shop.Example:8080"), ("shop.example".to_string(), Some(8080)));
        assert_eq!(split_host("shop.example"), ("shop.example".to_string(), None));
        assert_eq!(split_host("[::1]:3000"), ("[::1]".to_string(), Some(3000)));
        assert_eq!(split_host("[::1]"), ("[::1]".to_string(), None));
    }
}
