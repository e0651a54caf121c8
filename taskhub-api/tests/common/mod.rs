//! Common test utilities for integration tests
//!
//! This module provides shared infrastructure for integration tests:
//! - A router wired to a fresh in-memory store (no database needed)
//! - Signup and login helpers
//! - A request helper returning status, parsed JSON, and raw bytes

#![allow(dead_code)]

use axum::{
    body::{Body, Bytes},
    http::{header, HeaderMap, Method, Request, StatusCode},
    Router,
};
use serde_json::Value;
use std::sync::Arc;
use taskhub_api::app::{build_router, AppState};
use taskhub_api::config::{ApiConfig, Config, DatabaseConfig, JwtConfig, LogFormat};
use taskhub_shared::store::{MemoryStore, UserStore};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "integration-test-secret-at-least-32-bytes";
pub const PASSWORD: &str = "Sup3r$ecret";

/// Response captured by [`TestContext::request`]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
    pub bytes: Bytes,
}

/// A registered and logged-in user
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

/// Test context containing all necessary resources
pub struct TestContext {
    pub app: Router,
    pub store: Arc<MemoryStore>,
    pub config: Config,
}

pub fn test_config() -> Config {
    Config {
        api: ApiConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            cors_origins: vec!["*".to_string()],
            production: false,
        },
        database: DatabaseConfig {
            url: "postgresql://unused".to_string(),
            max_connections: 1,
        },
        jwt: JwtConfig {
            secret: TEST_SECRET.to_string(),
        },
        log_format: LogFormat::Pretty,
    }
}

impl TestContext {
    /// Creates a new test context with an empty store
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let config = test_config();
        let state = AppState::new(store.clone(), config.clone()).expect("Failed to build state");

        Self {
            app: build_router(state),
            store,
            config,
        }
    }

    /// Sends one request through the router
    pub async fn request(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        self.send(request).await
    }

    /// Sends a prebuilt request, for tests that need custom headers
    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.expect("Router failed");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read body");
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
            bytes,
        }
    }

    pub async fn signup(&self, username: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/user/signup",
            None,
            Some(serde_json::json!({
                "username": username,
                "email": format!("{}@example.com", username),
                "password": password,
                "passwordConfirmation": password,
            })),
        )
        .await
    }

    pub async fn login(&self, email: &str, password: &str) -> TestResponse {
        self.request(
            Method::POST,
            "/api/user/login",
            None,
            Some(serde_json::json!({ "email": email, "password": password })),
        )
        .await
    }

    /// Signs up `username` with [`PASSWORD`] and logs in
    pub async fn user(&self, username: &str) -> TestUser {
        let signup = self.signup(username, PASSWORD).await;
        assert_eq!(signup.status, StatusCode::CREATED, "signup failed: {}", signup.body);

        let login = self.login(&format!("{}@example.com", username), PASSWORD).await;
        assert_eq!(login.status, StatusCode::OK, "login failed: {}", login.body);

        let id = self
            .store
            .find_user_by_username(username)
            .await
            .expect("Store failed")
            .expect("User missing")
            .id;

        TestUser {
            id,
            username: username.to_string(),
            token: login.body["token"].as_str().expect("No token").to_string(),
        }
    }

    /// Creates a task as `owner` and returns its JSON
    pub async fn create_task(&self, owner: &TestUser, body: Value) -> Value {
        let response = self.request(Method::POST, "/api/tasks", Some(&owner.token), Some(body)).await;
        assert_eq!(response.status, StatusCode::CREATED, "create failed: {}", response.body);
        response.body
    }
}
