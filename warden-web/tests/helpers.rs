//! Integration test helpers
//!
//! Builds the full application over an in-memory database and drives it
//! without binding a socket.

#![allow(dead_code)]

use axum::{
    body::Body,
    http::{header::AUTHORIZATION, HeaderMap, Method, Request, StatusCode},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use jsonwebtoken::{encode, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::LazyLock;
use tower::ServiceExt;
use warden_core::{ApiClient, User};
use warden_web::{
    create_app,
    storage::{SqliteTokenRepository, SqliteUserRepository},
    AppState, WebConfig,
};

pub const JWT_SECRET: &str = "integration-secret";
pub const PROBLEM_BASE_URL: &str = "https://warden.test/problems/";

// Tracing is initialized once per test binary
static TRACING: LazyLock<()> = LazyLock::new(|| {
    if std::env::var("TEST_LOG").is_ok() {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_writer(std::io::sink)
            .finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
});

/// Response pieces the tests look at
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

/// Test application instance
pub struct TestApp {
    pub state: AppState,
    pub users: SqliteUserRepository,
    pub tokens: SqliteTokenRepository,
}

impl TestApp {
    pub async fn spawn() -> Self {
        LazyLock::force(&TRACING);

        let mut config = WebConfig::default();
        config.problem_base_url = PROBLEM_BASE_URL.to_string();
        config.oauth2.jwt_secret = Some(JWT_SECRET.to_string());

        let state = AppState::new(config)
            .await
            .expect("Failed to build application state");

        Self {
            users: SqliteUserRepository::new(state.pool.clone()),
            tokens: SqliteTokenRepository::new(state.pool.clone()),
            state,
        }
    }

    pub fn router(&self) -> Router {
        create_app(self.state.clone())
    }

    pub async fn create_user(&self, id: &str, username: &str) {
        self.users
            .create_user(&User {
                id: id.to_string(),
                username: username.to_string(),
                email: format!("{}@example.com", username),
                can_login: true,
            })
            .await
            .expect("Failed to create user");
    }

    pub async fn create_api_client(&self, id: &str, user_id: &str) {
        self.users
            .create_api_client(&ApiClient {
                id: id.to_string(),
                user_id: user_id.to_string(),
                description: "integration".to_string(),
            })
            .await
            .expect("Failed to create API client");
    }

    /// Put `user_id` in group `group` and grant the group `resource`
    pub async fn grant(&self, user_id: &str, group: &str, resource: &str) {
        let pool = &self.state.pool;

        sqlx::query("INSERT OR IGNORE INTO user_groups (id, identifier) VALUES (?, ?)")
            .bind(group)
            .bind(group)
            .execute(pool)
            .await
            .expect("Failed to seed user group");
        sqlx::query("INSERT OR IGNORE INTO admin_resources (id, identifier) VALUES (?, ?)")
            .bind(resource)
            .bind(resource)
            .execute(pool)
            .await
            .expect("Failed to seed admin resource");
        sqlx::query("INSERT INTO users_user_groups (user_id, user_group_id) VALUES (?, ?)")
            .bind(user_id)
            .bind(group)
            .execute(pool)
            .await
            .expect("Failed to seed membership");
        sqlx::query(
            "INSERT INTO user_groups_admin_resources (user_group_id, admin_resource_id) VALUES (?, ?)",
        )
        .bind(group)
        .bind(resource)
        .execute(pool)
        .await
        .expect("Failed to seed grant");
    }

    pub async fn reload_policies(&self) -> usize {
        self.state
            .authorizer
            .reload()
            .await
            .expect("Failed to reload policies")
    }

    /// Sign an access token; `expires_in` is in seconds and may be negative
    pub async fn issue_token(&self, jti: &str, sub: &str, aud: &str, expires_in: i64) -> String {
        let expires_at = Utc::now() + Duration::seconds(expires_in);
        self.tokens
            .record(jti, aud, expires_at)
            .await
            .expect("Failed to record token");

        encode(
            &Header::default(),
            &json!({
                "jti": jti,
                "sub": sub,
                "aud": aud,
                "exp": expires_at.timestamp(),
                "scopes": [],
            }),
            &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
        )
        .expect("Failed to sign token")
    }

    pub async fn send(&self, method: Method, uri: &str, token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = builder.body(Body::empty()).expect("Failed to build request");

        let response = self
            .router()
            .oneshot(request)
            .await
            .expect("Failed to execute request");
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to read body")
            .to_bytes();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);

        TestResponse {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::GET, uri, token).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.send(Method::POST, uri, token).await
    }
}

/// Assert the body is an authentication problem with the given status
pub fn assert_auth_problem(response: &TestResponse, status: StatusCode) {
    assert_eq!(response.status, status);
    assert_eq!(
        response.headers.get("content-type").unwrap(),
        "application/problem+json"
    );
    assert_eq!(
        response.body["type"],
        format!("{}request-authentication-failure", PROBLEM_BASE_URL)
    );
    assert_eq!(response.body["title"], "Access Denied");
    assert_eq!(response.body["status"], status.as_u16());
}
