mod common;

use axum::http::{Method, StatusCode};
use common::TestApp;

#[tokio::test]
async fn health_check_reports_backends() {
    let app = TestApp::spawn().await;

    let (status, body) = app.request(Method::GET, "/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "identity-service-test");
    assert_eq!(body["checks"]["store"], "up");
    assert_eq!(body["checks"]["revocation_list"], "up");
}

#[tokio::test]
async fn openapi_document_lists_workflow_paths() {
    let app = TestApp::spawn().await;

    let (status, body) = app
        .request(Method::GET, "/.well-known/openapi.json", None, None)
        .await;

    assert_eq!(status, StatusCode::OK);
    for path in [
        "/register",
        "/login",
        "/logout",
        "/identities/pending",
        "/identities/{id}/approve",
        "/identities/{id}/suspend",
    ] {
        assert!(body["paths"].get(path).is_some(), "missing {}", path);
    }
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::spawn().await;
    let response = tower::util::ServiceExt::oneshot(
        app.router.clone(),
        axum::http::Request::builder()
            .uri("/health")
            .body(axum::body::Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}
