mod common;

use common::*;
use keeper_client::{AuthorityClient, CallClass};
use keeper_gate::{ActivationHandler, ActivationOutcome, ActivationSubmission};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_reactivate(authority: &MockServer, status: u16, times: u64) {
    Mock::given(method("POST"))
        .and(path("/api/project/42/reactivate"))
        .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({"status": "success"})))
        .expect(times)
        .mount(authority)
        .await;
}

fn location(resp: &reqwest::Response) -> String {
    resp.headers()["location"].to_str().unwrap().to_string()
}

fn decoded(location: &str) -> String {
    urlencoding::decode(location).unwrap().into_owned()
}

// ── Round trip ──────────────────────────────────────────────────

#[tokio::test]
async fn correct_code_reactivates_and_renders_success_page() {
    let authority = MockServer::start().await;
    mount_project(&authority, project_info(false, "SECRET-42", Some("Unpaid"))).await;
    mount_reactivate(&authority, 200, 1).await;

    let flag = sentinel();
    let base = spawn_guarded(gatekeeper_for(&authority), flag.clone()).await;
    let resp = browser()
        .post(format!("{base}/admin"))
        .form(&[("activation_code", "SECRET-42")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 200);
    assert_eq!(resp.headers()["cache-control"], "no-cache, no-store, must-revalidate");
    let body = resp.text().await.unwrap();
    assert!(body.contains("Project reactivated successfully"));
    assert!(body.contains("http-equiv=\"refresh\" content=\"3;url=/admin?success="));
    assert!(body.contains("setTimeout"));
    assert!(!touched(&flag));
}

#[tokio::test]
async fn wrong_code_redirects_with_error_and_skips_reactivate() {
    let authority = MockServer::start().await;
    mount_project(&authority, project_info(false, "SECRET-42", None)).await;
    mount_reactivate(&authority, 200, 0).await;

    let flag = sentinel();
    let base = spawn_guarded(gatekeeper_for(&authority), flag.clone()).await;
    let resp = browser()
        .post(format!("{base}/admin"))
        .form(&[("activation_code", "guess")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 303);
    let target = location(&resp);
    assert!(target.starts_with("/admin?error="));
    assert_eq!(decoded(&target), "/admin?error=Invalid activation code");
    assert!(!touched(&flag));
}

#[tokio::test]
async fn code_comparison_is_exact() {
    let authority = MockServer::start().await;
    mount_project(&authority, project_info(false, "Secret-42", None)).await;
    mount_reactivate(&authority, 200, 0).await;

    let base = spawn_guarded(gatekeeper_for(&authority), sentinel()).await;
    let resp = browser()
        .post(format!("{base}/"))
        .form(&[("activation_code", "SECRET-42")])
        .send()
        .await
        .unwrap();
    assert!(decoded(&location(&resp)).ends_with("Invalid activation code"));
}

// ── Redirect hygiene ────────────────────────────────────────────

#[tokio::test]
async fn redirect_drops_existing_query() {
    let authority = MockServer::start().await;
    mount_project(&authority, project_info(false, "SECRET-42", None)).await;
    mount_reactivate(&authority, 200, 0).await;

    let base = spawn_guarded(gatekeeper_for(&authority), sentinel()).await;
    let resp = browser()
        .post(format!("{base}/admin?foo=bar&activation_code=XYZ&error=old"))
        .form(&[("activation_code", "XYZ")])
        .send()
        .await
        .unwrap();

    let target = location(&resp);
    assert!(target.starts_with("/admin?error="));
    assert!(!target.contains("foo=bar"));
    assert!(!target.contains("activation_code"));
    assert_eq!(target.matches('?').count(), 1);
    assert_eq!(target.matches("error=").count(), 1);
}

#[tokio::test]
async fn success_target_drops_existing_query() {
    let authority = MockServer::start().await;
    mount_project(&authority, project_info(false, "XYZ", None)).await;
    mount_reactivate(&authority, 200, 1).await;

    let base = spawn_guarded(gatekeeper_for(&authority), sentinel()).await;
    let body = browser()
        .post(format!("{base}/admin?foo=bar&activation_code=XYZ"))
        .form(&[("activation_code", "XYZ")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("url=/admin?success="));
    assert!(!body.contains("foo=bar"));
}

// ── Failure messages ────────────────────────────────────────────

#[tokio::test]
async fn empty_code_asks_for_input() {
    let authority = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(project_info(false, "X", None)))
        .expect(0)
        .mount(&authority)
        .await;

    let base = spawn_guarded(gatekeeper_for(&authority), sentinel()).await;
    let resp = browser()
        .post(format!("{base}/"))
        .form(&[("activation_code", "   ")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 303);
    assert_eq!(decoded(&location(&resp)), "/?error=Please enter the activation code");
}

#[tokio::test]
async fn failed_reactivation_redirects_with_error() {
    let authority = MockServer::start().await;
    mount_project(&authority, project_info(false, "SECRET-42", None)).await;
    mount_reactivate(&authority, 500, 1).await;

    let base = spawn_guarded(gatekeeper_for(&authority), sentinel()).await;
    let resp = browser()
        .post(format!("{base}/admin"))
        .form(&[("activation_code", "SECRET-42")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 303);
    assert_eq!(decoded(&location(&resp)), "/admin?error=Reactivation failed");
}

#[tokio::test]
async fn missing_project_redirects_with_error() {
    let authority = MockServer::start().await;
    mount_project(&authority, serde_json::json!({"data": null})).await;

    let base = spawn_guarded(gatekeeper_for(&authority), sentinel()).await;
    let resp = browser()
        .post(format!("{base}/admin"))
        .form(&[("activation_code", "ANY")])
        .send()
        .await
        .unwrap();
    assert_eq!(decoded(&location(&resp)), "/admin?error=Project not found");
}

#[tokio::test]
async fn lookup_failure_redirects_with_connection_error() {
    let authority = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/project/info"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&authority)
        .await;

    let flag = sentinel();
    let base = spawn_guarded(gatekeeper_for(&authority), flag.clone()).await;
    let resp = browser()
        .post(format!("{base}/admin"))
        .form(&[("activation_code", "ANY")])
        .send()
        .await
        .unwrap();

    assert_eq!(resp.status(), 303);
    assert_eq!(
        decoded(&location(&resp)),
        "/admin?error=Connection to the control server failed"
    );
    assert!(!touched(&flag));
}

// ── Handler API ─────────────────────────────────────────────────

#[test]
fn submission_from_form_body() {
    let sub = ActivationSubmission::from_form(b"name=x&activation_code=+ABC-1+").unwrap();
    assert_eq!(sub.code(), "ABC-1");
    assert!(ActivationSubmission::from_form(b"name=x").is_none());
    assert!(!format!("{sub:?}").contains("ABC"));
}

#[tokio::test]
async fn submit_reports_outcome() {
    let authority = MockServer::start().await;
    mount_project(&authority, project_info(false, "OK", None)).await;
    mount_reactivate(&authority, 200, 1).await;

    let config = config_for(&authority);
    let handler = ActivationHandler::new(
        Arc::new(AuthorityClient::new(config.clone()).unwrap()),
        config.timeout(CallClass::Status),
        config.timeout(CallClass::Activation),
    );
    let outcome = handler
        .submit("shop.example", &ActivationSubmission::new("OK"))
        .await;
    assert_eq!(outcome, ActivationOutcome::Reactivated);
}

#[tokio::test]
async fn validate_code_uses_check_endpoint() {
    let authority = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/check-project-status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "status": "success",
            "data": { "is_active": false },
        })))
        .expect(1)
        .mount(&authority)
        .await;

    let gatekeeper = gatekeeper_for(&authority);
    let check = gatekeeper.activation().validate_code("shop.example", " CODE ").await;
    assert!(check.valid);
    assert!(!check.is_active);
}

#[tokio::test]
async fn validate_code_failure_is_invalid() {
    let authority = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&authority)
        .await;

    let check = gatekeeper_for(&authority)
        .activation()
        .validate_code("shop.example", "CODE")
        .await;
    assert!(!check.valid);
}
