#![allow(dead_code)]

use axum::Router;
use axum::routing::get;
use keeper_client::{AuthorityClient, ClientConfig};
use keeper_gate::Gatekeeper;
use keeper_gate::middleware::{GuardState, protect};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Domain the gate sees for requests sent to the test server.
pub const LOCAL_DOMAIN: &str = "127.0.0.1";

pub fn config_for(authority: &MockServer) -> ClientConfig {
    ClientConfig {
        status_timeout_ms: 300,
        activation_timeout_ms: 1_000,
        ..ClientConfig::with_base_url(format!("{}/api", authority.uri()))
    }
}

pub fn gatekeeper_for(authority: &MockServer) -> Gatekeeper {
    let config = config_for(authority);
    let client = Arc::new(AuthorityClient::new(config.clone()).unwrap());
    Gatekeeper::from_config(client, &config)
}

pub fn project_info(is_active: bool, code: &str, reason: Option<&str>) -> serde_json::Value {
    serde_json::json!({
        "data": {
            "id": 42,
            "activation_code": code,
            "is_active": is_active,
            "suspended_reason": reason,
            "project_name": "Shop",
        }
    })
}

pub async fn mount_project(authority: &MockServer, body: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/project/info"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(authority)
        .await;
}

/// Host application whose handlers flip `sentinel` when they run.
pub fn host_app(sentinel: Arc<AtomicBool>) -> Router {
    let touch = move |body: String| {
        let sentinel = Arc::clone(&sentinel);
        async move {
            sentinel.store(true, Ordering::SeqCst);
            format!("host:{body}")
        }
    };
    Router::new()
        .route("/", get(touch.clone()).post(touch.clone()))
        .route("/admin", get(touch.clone()).post(touch))
}

/// Spin up the guarded host on an OS-assigned port, returning the base URL.
pub async fn spawn_guarded(gatekeeper: Gatekeeper, sentinel: Arc<AtomicBool>) -> String {
    let app = protect(host_app(sentinel), GuardState::new(gatekeeper));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://127.0.0.1:{port}")
}

pub fn browser() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap()
}

pub fn sentinel() -> Arc<AtomicBool> {
    Arc::new(AtomicBool::new(false))
}

pub fn touched(sentinel: &AtomicBool) -> bool {
    sentinel.load(Ordering::SeqCst)
}
