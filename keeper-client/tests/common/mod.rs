#![allow(dead_code)]

use keeper_client::{AuthorityClient, ClientConfig};
use keeper_types::{AppDescriptor, RequestContext, SystemInfo};
use std::sync::Arc;
use wiremock::MockServer;

pub const DOMAIN: &str = "shop.example";

pub fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::with_base_url(format!("{}/api", server.uri()))
}

pub fn client_for(server: &MockServer) -> Arc<AuthorityClient> {
    Arc::new(AuthorityClient::new(config_for(server)).unwrap())
}

pub fn system_info() -> SystemInfo {
    let mut ctx = RequestContext::new(DOMAIN, "/checkout?step=2");
    ctx.remote_addr = Some("203.0.113.7".to_string());
    ctx.user_agent = Some("Mozilla/5.0".to_string());
    ctx.port = Some(443);
    SystemInfo::assemble(&AppDescriptor::new("Shop"), &ctx)
}

pub fn project_info_body(id: u64, code: &str, is_active: bool) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": id,
            "activation_code": code,
            "is_active": is_active,
            "suspended_reason": null,
            "project_name": "Shop",
            "domain": DOMAIN,
        }
    })
}
