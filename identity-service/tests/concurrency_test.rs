//! Racing approvals must collapse into a single state change.

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use common::TestApp;
use identity_service::{
    models::{Channel, Role},
    services::Principal,
};
use tower::util::ServiceExt;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_approvals_emit_exactly_one_notification() {
    let app = TestApp::spawn().await;
    let id = app.register_member("race@example.com").await;
    let reviewer = app.reviewer_token().await;
    let mut inbox = app
        .state
        .dispatcher
        .subscribe(
            &Principal {
                identity_id: id,
                role: Role::Member,
            },
            Channel::UserBroadcast(id),
        )
        .unwrap();

    let requests = (0..8).map(|_| {
        let router = app.router.clone();
        let request = Request::builder()
            .method("POST")
            .uri(format!("/identities/{}/approve", id))
            .header(header::AUTHORIZATION, format!("Bearer {}", reviewer))
            .body(Body::empty())
            .unwrap();
        tokio::spawn(async move { router.oneshot(request).await.unwrap() })
    });

    let mut changed = 0;
    for response in futures::future::join_all(requests).await {
        let response = response.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["identity"]["status"], "active");
        if body["changed"] == true {
            changed += 1;
        }
    }

    assert_eq!(changed, 1);
    assert!(inbox.try_recv().is_some());
    assert!(inbox.try_recv().is_none());
}
