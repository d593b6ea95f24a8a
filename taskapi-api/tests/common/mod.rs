/// Common test utilities for API tests
///
/// This module provides shared infrastructure for API tests:
/// - An in-memory store behind the real router
/// - Test user creation and token generation
/// - A request helper returning status and JSON body

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use serde_json::Value;
use taskapi_api::app::{build_router, AppState};
use taskapi_api::config::Config;
use taskapi_shared::auth::{jwt::issue_token, password::hash_password};
use taskapi_shared::models::user::{CreateUser, User};
use taskapi_shared::store::{memory::MemoryStore, TaskStore};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_SECRET: &str = "test-secret-key-at-least-32-bytes-long";
pub const TEST_PASSWORD: &str = "correct horse battery";

/// Test context containing all necessary resources
pub struct TestContext {
    pub store: Arc<MemoryStore>,
    pub app: axum::Router,
    pub config: Config,
    pub user: User,
    pub jwt_token: String,
}

impl TestContext {
    /// Creates a new test context with a fresh store and one user
    pub async fn new() -> anyhow::Result<Self> {
        let config = test_config()?;
        let store = Arc::new(MemoryStore::new());
        let (user, jwt_token) = create_user(&store, &config).await?;

        let state = AppState::new(store.clone(), config.clone());
        let app = build_router(state);

        Ok(TestContext {
            store,
            app,
            config,
            user,
            jwt_token,
        })
    }

    /// Creates another user and returns a token for them
    pub async fn add_user(&self) -> anyhow::Result<(User, String)> {
        create_user(&self.store, &self.config).await
    }

    /// Returns authorization header value
    pub fn auth_header(&self) -> String {
        format!("Bearer {}", self.jwt_token)
    }

    /// Sends a request with the context user's token
    pub async fn send(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        self.send_as(Some(&self.auth_header()), method, uri, body).await
    }

    /// Sends a request with an arbitrary (or no) authorization header
    pub async fn send_as(
        &self,
        auth_header: Option<&str>,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(value) = auth_header {
            builder = builder.header("authorization", value);
        }

        let request = match body {
            Some(json) => builder
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        (status, json)
    }
}

/// Config as the server would load it, without touching the environment
pub fn test_config() -> anyhow::Result<Config> {
    Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgresql://unused/test".to_string()),
        "JWT_SECRET" => Some(TEST_SECRET.to_string()),
        _ => None,
    })
}

/// Creates a user with a random email and [`TEST_PASSWORD`]
async fn create_user(store: &MemoryStore, config: &Config) -> anyhow::Result<(User, String)> {
    let user = store
        .create_user(CreateUser {
            email: format!("test-{}@example.com", Uuid::new_v4()),
            password_hash: hash_password(TEST_PASSWORD)?,
            first_name: Some("Test".to_string()),
            last_name: Some("User".to_string()),
        })
        .await?;

    let token = issue_token(&user.email, config.jwt.ttl(), &config.jwt.secret)?;

    Ok((user, token))
}

/// Body for a valid task creation request
pub fn task_body(name: &str) -> Value {
    serde_json::json!({
        "task_name": name,
        "task_description": "2%",
        "task_status": "todo",
        "deadline": "2030-01-01T00:00:00Z",
    })
}
