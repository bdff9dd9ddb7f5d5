#![allow(dead_code)]

use keeper_agent::{Agent, AgentConfig};
use keeper_client::ClientConfig;
use keeper_identity::{AppSecret, IdentityStrategy};
use keeper_types::RequestContext;
use std::fs;
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const DOMAIN: &str = "shop.example";

pub fn ctx() -> RequestContext {
    RequestContext::new(DOMAIN, "/")
}

pub fn config(root: &TempDir, authority: &MockServer) -> AgentConfig {
    let mut config = AgentConfig::new(root.path(), "Shop", IdentityStrategy::Deterministic);
    config.app_secret = AppSecret::new("base64:dGVzdC1rZXk=");
    config.client = ClientConfig {
        heartbeat_timeout_ms: 1_000,
        status_timeout_ms: 500,
        ..ClientConfig::with_base_url(format!("{}/api", authority.uri()))
    };
    config
}

pub fn agent(root: &TempDir, authority: &MockServer) -> Agent {
    Agent::new(config(root, authority)).unwrap()
}

pub fn write_env(root: &TempDir, contents: &str) {
    fs::write(root.path().join(".env"), contents).unwrap();
}

pub async fn mount_store(authority: &MockServer, status: u16, body: serde_json::Value, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/store-project"))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(times)
        .mount(authority)
        .await;
}

pub async fn mount_ok(authority: &MockServer, http_method: &str, endpoint: &str) {
    Mock::given(method(http_method))
        .and(path(endpoint))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "success"})))
        .mount(authority)
        .await;
}

pub fn project_info(is_active: bool) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": 42,
            "activation_code": "ACT-42",
            "is_active": is_active,
            "suspended_reason": "Licence expired",
            "project_name": "Shop",
        }
    })
}

/// Counts requests received for `endpoint`.
pub async fn hits(authority: &MockServer, endpoint: &str) -> usize {
    authority
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|r| r.url.path() == endpoint)
        .count()
}

/// Polls until `endpoint` has been hit at least once or `limit` passes.
pub async fn wait_for_hit(authority: &MockServer, endpoint: &str, limit: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + limit;
    while tokio::time::Instant::now() < deadline {
        if hits(authority, endpoint).await > 0 {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    false
}
