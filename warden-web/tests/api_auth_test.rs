//! End-to-end authentication and authorization through the router

mod helpers;

use axum::http::StatusCode;
use helpers::{assert_auth_problem, TestApp};

const DENIED: &str = "The resource owner or authorization server denied the request.";

#[tokio::test]
async fn health_check_needs_no_token() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/health", None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "healthy");
}

#[tokio::test]
async fn user_token_reaches_handler() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_api_client("c1", "u1").await;
    let token = app.issue_token("t1", "u1", "c1", 600).await;

    let response = app.get("/api/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["id"], "u1");
    assert_eq!(response.body["username"], "alice");
}

#[tokio::test]
async fn client_credentials_token_resolves_client_owner() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_api_client("c1", "u1").await;
    let token = app.issue_token("t1", "", "c1", 600).await;

    let response = app.get("/api/me", Some(&token)).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["username"], "alice");
}

#[tokio::test]
async fn missing_token_is_denied() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/me", None).await;

    assert_auth_problem(&response, StatusCode::UNAUTHORIZED);
    assert_eq!(response.body["detail"], DENIED);
}

#[tokio::test]
async fn garbage_token_is_denied() {
    let app = TestApp::spawn().await;

    let response = app.get("/api/me", Some("definitely.not.valid")).await;

    assert_auth_problem(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_token_is_denied() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_api_client("c1", "u1").await;
    let token = app.issue_token("t1", "u1", "c1", -3600).await;

    let response = app.get("/api/me", Some(&token)).await;

    assert_auth_problem(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn revoked_token_is_denied() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_api_client("c1", "u1").await;
    let token = app.issue_token("t1", "u1", "c1", 600).await;
    assert!(app.tokens.revoke("t1").await.unwrap());

    let response = app.get("/api/me", Some(&token)).await;

    assert_auth_problem(&response, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_owner_is_server_error() {
    let app = TestApp::spawn().await;
    let token = app.issue_token("t1", "ghost", "no-such-client", 600).await;

    let response = app.get("/api/me", Some(&token)).await;

    assert_auth_problem(&response, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.body["detail"], "unknown_error");
}

#[tokio::test]
async fn deleted_user_is_not_resolved() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_api_client("c1", "u1").await;
    let token = app.issue_token("t1", "u1", "c1", 600).await;
    sqlx::query("UPDATE users SET deleted_at = '2024-01-01' WHERE id = 'u1'")
        .execute(&app.state.pool)
        .await
        .unwrap();

    let response = app.get("/api/me", Some(&token)).await;

    assert_auth_problem(&response, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn access_follows_group_grants() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_api_client("c1", "u1").await;
    app.grant("u1", "editors", "pages").await;
    assert_eq!(app.reload_policies().await, 2);
    let token = app.issue_token("t1", "u1", "c1", 600).await;

    let granted = app.get("/api/access/pages", Some(&token)).await;
    assert_eq!(granted.status, StatusCode::OK);
    assert_eq!(granted.body["subject"], "alice");
    assert_eq!(granted.body["resource"], "pages");
    assert_eq!(granted.body["allowed"], true);

    let other = app.get("/api/access/users", Some(&token)).await;
    assert_eq!(other.status, StatusCode::OK);
    assert_eq!(other.body["allowed"], false);
}

#[tokio::test]
async fn policy_reload_requires_admin_resource() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_user("u2", "bob").await;
    app.create_api_client("c1", "u1").await;
    app.create_api_client("c2", "u2").await;
    app.grant("u1", "admins", "admin-policies").await;
    app.grant("u2", "editors", "pages").await;
    app.reload_policies().await;

    let bob = app.issue_token("t2", "u2", "c2", 600).await;
    let forbidden = app.post("/api/admin/policies/reload", Some(&bob)).await;
    assert_eq!(forbidden.status, StatusCode::FORBIDDEN);
    assert_eq!(forbidden.body["error"], "forbidden");

    let alice = app.issue_token("t1", "u1", "c1", 600).await;
    let reloaded = app.post("/api/admin/policies/reload", Some(&alice)).await;
    assert_eq!(reloaded.status, StatusCode::OK);
    assert_eq!(reloaded.body["grants"], 4);
}

#[tokio::test]
async fn names_shared_across_kinds_grant_nothing() {
    let app = TestApp::spawn().await;
    app.create_user("u1", "alice").await;
    app.create_user("u2", "admin-policies").await;
    app.create_user("u3", "admins").await;
    app.create_api_client("c1", "u1").await;
    app.create_api_client("c2", "u2").await;
    app.create_api_client("c3", "u3").await;
    app.grant("u1", "editors", "pages").await;
    app.grant("u1", "admins", "admin-policies").await;
    app.reload_policies().await;

    for (jti, user, client) in [("t2", "u2", "c2"), ("t3", "u3", "c3")] {
        let token = app.issue_token(jti, user, client, 600).await;
        let response = app.post("/api/admin/policies/reload", Some(&token)).await;
        assert_eq!(response.status, StatusCode::FORBIDDEN);
    }

    let alice = app.issue_token("t1", "u1", "c1", 600).await;
    let membership = app.get("/api/access/editors", Some(&alice)).await;
    assert_eq!(membership.status, StatusCode::OK);
    assert_eq!(membership.body["allowed"], false);
}

#[tokio::test]
async fn reload_without_token_is_denied() {
    let app = TestApp::spawn().await;

    let response = app.post("/api/admin/policies/reload", None).await;

    assert_auth_problem(&response, StatusCode::UNAUTHORIZED);
}
