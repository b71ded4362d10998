//! Common test utilities for integration tests
//!
//! Builds the full router over an in-memory credential store, bootstrapped
//! with the default `admin` / `admin123` account.

#![allow(dead_code)]

use auth_service_backend::{
    config::{AppConfig, PasswordConfig},
    repositories::InMemoryCredentialStore,
    routes,
    services::AuthService,
    state::AppState,
};
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;

/// Test application wrapper
pub struct TestApp {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<InMemoryCredentialStore>,
}

impl TestApp {
    /// Create a new test application with a freshly bootstrapped store
    pub async fn new() -> Self {
        let store = Arc::new(InMemoryCredentialStore::new());
        let state = AppState::new(store.clone(), test_config()).expect("Failed to build state");

        AuthService::bootstrap_default_account(
            state.store(),
            state.passwords(),
            "admin",
            "admin123",
        )
        .await
        .expect("Failed to bootstrap default account");

        let app = routes::create_router(state.clone());

        Self { app, state, store }
    }

    /// Make a GET request
    pub async fn get(&self, path: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, path: &str, body: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        self.send(request).await
    }

    /// Make an empty POST request carrying an Authorization header
    pub async fn post_auth(&self, path: &str, authorization: &str) -> (StatusCode, String) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Authorization", authorization)
            .body(Body::empty())
            .unwrap();

        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, String) {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_str = String::from_utf8(body.to_vec()).unwrap();

        (status, body_str)
    }
}

/// Default config with cheap argon2 parameters
pub fn test_config() -> AppConfig {
    AppConfig {
        password: PasswordConfig {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        },
        ..AppConfig::default()
    }
}
