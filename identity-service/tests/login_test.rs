mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::{TestApp, MEMBER_SECRET};
use serde_json::json;
use tower::util::ServiceExt;

#[tokio::test]
async fn wrong_secret_and_unknown_identifier_look_the_same() {
    let app = TestApp::spawn().await;
    app.active_member("known@example.com").await;

    let wrong_secret = app.login("known@example.com", "NotTheSecret1").await;
    let unknown = app.login("unknown@example.com", MEMBER_SECRET).await;

    assert_eq!(wrong_secret.0, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_secret, unknown);
}

#[tokio::test]
async fn login_is_case_insensitive_on_identifier() {
    let app = TestApp::spawn().await;
    app.active_member("Mixed@Example.com").await;

    let (status, body) = app.login("MIXED@example.COM", MEMBER_SECRET).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["identity"]["identifier"], "mixed@example.com");
}

#[tokio::test]
async fn each_login_is_an_independent_session() {
    let app = TestApp::spawn().await;
    let (_, first) = app.active_member("multi@example.com").await;
    let (_, body) = app.login("multi@example.com", MEMBER_SECRET).await;
    let second = body["token"].as_str().unwrap().to_string();
    assert_ne!(first, second);

    let (status, _) = app
        .request(axum::http::Method::POST, "/logout", Some(&first), None)
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .request(axum::http::Method::GET, "/me", Some(&second), None)
        .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn register_validates_input() {
    let app = TestApp::spawn().await;

    let (status, _) = app
        .request(
            axum::http::Method::POST,
            "/register",
            None,
            Some(json!({
                "identifier": "not-an-email",
                "secret": "short",
                "first_name": "",
                "last_name": "Dela Cruz",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = app
        .request(
            axum::http::Method::POST,
            "/register",
            None,
            Some(json!({
                "identifier": "u1@example.com",
                "secret": "Password123",
                "first_name": "Juan",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].as_str().unwrap().contains("last_name"));

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{not json"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn duplicate_registration_is_rejected() {
    let app = TestApp::spawn().await;
    app.register_member("dup@example.com").await;

    let (status, body) = app.register("DUP@example.com").await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "Identifier already registered");
}

#[tokio::test]
async fn new_registration_is_pending_member() {
    let app = TestApp::spawn().await;

    let (status, body) = app.register("fresh@example.com").await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["identity"]["status"], "pending");
    assert_eq!(body["identity"]["role"], "member");
    assert!(body["identity"].get("credential_hash").is_none());
}
