//! Test helpers for identity-service integration tests.
//!
//! Everything runs in memory: the router is driven with `oneshot`, backed by
//! the in-memory identity store, profile directory and revocation list.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use identity_service::{
    bootstrap_reviewer, build_router,
    config::{
        BootstrapReviewerConfig, BroadcastConfig, DatabaseConfig, Environment, IdentityConfig,
        RateLimitConfig, RedisConfig, SecurityConfig, SessionConfig,
    },
    services::{InMemoryIdentityStore, InMemoryProfileDirectory, InMemoryRevocationList},
    AppState,
};
use secrecy::SecretString;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::util::ServiceExt;
use uuid::Uuid;

pub const REVIEWER_IDENTIFIER: &str = "reviewer@example.com";
pub const REVIEWER_SECRET: &str = "ReviewerPass123";
pub const MEMBER_SECRET: &str = "MemberPass123";

pub fn test_config() -> IdentityConfig {
    IdentityConfig {
        common: service_core::config::Config::default(),
        environment: Environment::Dev,
        service_name: "identity-service-test".to_string(),
        service_version: "test".to_string(),
        log_level: "error".to_string(),
        otlp_endpoint: None,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 1,
            acquire_timeout_seconds: 1,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        session: SessionConfig {
            secret: SecretString::new("integration-test-session-secret-0123456789".to_string()),
            expiry_minutes: 60,
        },
        security: SecurityConfig {
            allowed_origins: vec!["http://localhost:3000".to_string()],
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
            register_attempts: 100,
            register_window_seconds: 60,
        },
        broadcast: BroadcastConfig {
            channel_capacity: 16,
        },
        bootstrap: Some(BootstrapReviewerConfig {
            identifier: REVIEWER_IDENTIFIER.to_string(),
            secret: SecretString::new(REVIEWER_SECRET.to_string()),
        }),
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn spawn() -> Self {
        Self::spawn_with(test_config()).await
    }

    /// Build the app over fresh in-memory backends and seed the reviewer.
    pub async fn spawn_with(config: IdentityConfig) -> Self {
        let bootstrap = config.bootstrap.clone();
        let state = AppState::new(
            config,
            Arc::new(InMemoryIdentityStore::new()),
            Arc::new(InMemoryProfileDirectory::new()),
            Arc::new(InMemoryRevocationList::new()),
            None,
        );

        if let Some(bootstrap) = bootstrap {
            bootstrap_reviewer(&state, &bootstrap)
                .await
                .expect("Failed to seed reviewer");
        }

        Self {
            router: build_router(state.clone()),
            state,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(body) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(body.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .router
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    pub async fn register(&self, identifier: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/register",
            None,
            Some(json!({
                "identifier": identifier,
                "secret": MEMBER_SECRET,
                "first_name": "Juan",
                "last_name": "Dela Cruz",
            })),
        )
        .await
    }

    /// Register and return the new identity id.
    pub async fn register_member(&self, identifier: &str) -> Uuid {
        let (status, body) = self.register(identifier).await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {}", body);
        body["identity"]["id"]
            .as_str()
            .and_then(|id| Uuid::parse_str(id).ok())
            .expect("identity id in register response")
    }

    pub async fn login(&self, identifier: &str, secret: &str) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/login",
            None,
            Some(json!({ "identifier": identifier, "secret": secret })),
        )
        .await
    }

    pub async fn reviewer_token(&self) -> String {
        let (status, body) = self.login(REVIEWER_IDENTIFIER, REVIEWER_SECRET).await;
        assert_eq!(status, StatusCode::OK, "reviewer login failed: {}", body);
        body["token"].as_str().unwrap().to_string()
    }

    pub async fn approve(&self, token: &str, id: Uuid) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            &format!("/identities/{}/approve", id),
            Some(token),
            None,
        )
        .await
    }

    pub async fn suspend(&self, token: &str, id: Uuid) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            &format!("/identities/{}/suspend", id),
            Some(token),
            None,
        )
        .await
    }

    /// Register, approve and log in a member; returns its id and token.
    pub async fn active_member(&self, identifier: &str) -> (Uuid, String) {
        let id = self.register_member(identifier).await;
        let reviewer = self.reviewer_token().await;
        let (status, _) = self.approve(&reviewer, id).await;
        assert_eq!(status, StatusCode::OK);

        let (status, body) = self.login(identifier, MEMBER_SECRET).await;
        assert_eq!(status, StatusCode::OK, "member login failed: {}", body);
        (id, body["token"].as_str().unwrap().to_string())
    }
}
