//! Per-request context and the system-info snapshot derived from it.
//!
//! The host builds a [`RequestContext`] once per inbound request from its own
//! request object. Everything that needs the domain, client address or URI
//! receives it explicitly; nothing reads ambient server state.

use serde::{Deserialize, Serialize};

/// Facts about the inbound request, sourced from the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    /// `Host` header without the port.
    pub domain: String,
    /// Listening port, if known.
    pub port: Option<u16>,
    /// Client address.
    pub remote_addr: Option<String>,
    /// Client user agent.
    pub user_agent: Option<String>,
    /// Path plus query, as received.
    pub request_uri: String,
    /// HTTP method.
    pub method: String,
    /// Server name the host is configured with.
    pub server_name: Option<String>,
    /// Server software banner.
    pub server_software: Option<String>,
    /// Protocol version, e.g. `HTTP/1.1`.
    pub protocol: String,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            domain: "localhost".to_string(),
            port: None,
            remote_addr: None,
            user_agent: None,
            request_uri: "/".to_string(),
            method: "GET".to_string(),
            server_name: None,
            server_software: None,
            protocol: "HTTP/1.1".to_string(),
        }
    }
}

impl RequestContext {
    /// Context for a request to `domain` at `request_uri`.
    #[must_use]
    pub fn new(domain: impl Into<String>, request_uri: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            request_uri: request_uri.into(),
            ..Self::default()
        }
    }

    /// Context used by scheduled ticks and CLI commands, where no request exists.
    #[must_use]
    pub fn detached(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            method: "CLI".to_string(),
            ..Self::default()
        }
    }

    /// Returns the request path with any query string removed.
    #[must_use]
    pub fn path(&self) -> &str {
        self.request_uri
            .split_once('?')
            .map_or(self.request_uri.as_str(), |(path, _)| path)
    }

    /// Returns the raw query string, if any.
    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.request_uri
            .split_once('?')
            .map(|(_, q)| q)
            .filter(|q| !q.is_empty())
    }

    /// Server name, falling back to the domain.
    #[must_use]
    pub fn server_name_or_domain(&self) -> &str {
        self.server_name.as_deref().unwrap_or(&self.domain)
    }
}

/// Static description of the host application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppDescriptor {
    /// Application name.
    pub project_name: String,
    /// Version of the runtime the host runs on.
    pub runtime_version: String,
    /// Version of the host framework.
    pub host_version: String,
    /// Deployment environment label.
    pub environment: String,
    /// Whether the host runs in debug mode.
    pub debug: bool,
}

impl AppDescriptor {
    /// Describes an application with the given name and this crate's runtime.
    #[must_use]
    pub fn new(project_name: impl Into<String>) -> Self {
        Self {
            project_name: project_name.into(),
            runtime_version: format!("keeper/{}", env!("CARGO_PKG_VERSION")),
            host_version: "unknown".to_string(),
            environment: "production".to_string(),
            debug: false,
        }
    }
}

/// Server details nested inside the snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub software: String,
    pub protocol: String,
    pub port: String,
    pub name: String,
}

/// Descriptive bundle sent with every remote call.
///
/// Assembled fresh for each call and never cached: the client address and
/// request URI legitimately change between calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemInfo {
    pub project_name: String,
    pub domain: String,
    pub runtime_version: String,
    pub host_version: String,
    pub environment: String,
    pub debug_mode: bool,
    pub server_info: ServerInfo,
    pub ip_address: String,
    pub user_agent: String,
    pub server_port: String,
    pub request_uri: String,
    pub request_method: String,
    pub server_name: String,
}

impl SystemInfo {
    /// Builds a snapshot from the application description and request context.
    #[must_use]
    pub fn assemble(app: &AppDescriptor, ctx: &RequestContext) -> Self {
        let port = ctx.port.map(|p| p.to_string()).unwrap_or_default();
        let server_name = ctx.server_name_or_domain().to_string();
        Self {
            project_name: app.project_name.clone(),
            domain: ctx.domain.clone(),
            runtime_version: app.runtime_version.clone(),
            host_version: app.host_version.clone(),
            environment: app.environment.clone(),
            debug_mode: app.debug,
            server_info: ServerInfo {
                software: ctx
                    .server_software
                    .clone()
                    .unwrap_or_else(|| "Unknown".to_string()),
                protocol: ctx.protocol.clone(),
                port: port.clone(),
                name: server_name.clone(),
            },
            ip_address: ctx
                .remote_addr
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            user_agent: ctx
                .user_agent
                .clone()
                .unwrap_or_else(|| "Unknown".to_string()),
            server_port: port,
            request_uri: ctx.request_uri.clone(),
            request_method: ctx.method.clone(),
            server_name,
        }
    }
}
