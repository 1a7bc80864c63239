//! HTTP-surface integration tests: route dispatch, auth gating, and the
//! handlers that don't depend on reaching a live upstream instance.

use axum::http::StatusCode;
use axum_test::TestServer;
use media_gateway::config::Config;
use media_gateway::web::{AppState, build_router};
use serde_json::json;

fn test_server() -> TestServer {
    let state = AppState::new(Config::default());
    TestServer::new(build_router(state)).expect("failed to start test server")
}

#[tokio::test]
async fn health_endpoint_returns_ok() {
    let server = test_server();
    let response = server.get("/health").await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "OK");
}

#[tokio::test]
async fn reserved_route_without_bearer_is_401() {
    let server = test_server();
    let response = server.get("/playlists/mine").await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn reserved_route_with_invalid_bearer_is_403() {
    let server = test_server();
    let response = server.get("/playlists/mine").add_header("Authorization", "Bearer not-a-real-jwt").await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn login_with_wrong_credentials_is_401_not_400() {
    let server = test_server();
    let response = server.post("/auth/login").json(&json!({"username": "demo", "password": "wrong"})).await;
    response.assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_with_valid_credentials_issues_a_bearer_token() {
    let server = test_server();
    let response = server.post("/auth/login").json(&json!({"username": "demo", "password": "demo-password"})).await;
    response.assert_status_ok();

    let body: serde_json::Value = response.json();
    assert_eq!(body["token_type"], "Bearer");
    assert!(body["access_token"].as_str().unwrap_or_default().contains('.'));
}

#[tokio::test]
async fn history_is_a_noop_for_guests() {
    let server = test_server();

    let listed = server.get("/history").await;
    listed.assert_status_ok();
    assert_eq!(listed.json::<Vec<serde_json::Value>>(), Vec::<serde_json::Value>::new());

    let recorded = server.post("/history").json(&json!({"videoId": "abc123"})).await;
    recorded.assert_status_ok();
    let body: serde_json::Value = recorded.json();
    assert_eq!(body["message"], "history is not recorded for guests");
}

#[tokio::test]
async fn history_records_for_an_authenticated_user_get_a_server_assigned_entry_id() {
    let server = test_server();

    let login = server.post("/auth/login").json(&json!({"username": "demo", "password": "demo-password"})).await;
    let token = login.json::<serde_json::Value>()["access_token"].as_str().unwrap().to_string();
    let auth_header = format!("Bearer {token}");

    let record = server
        .post("/history")
        .add_header("Authorization", auth_header.clone())
        .json(&json!({"videoId": "abc123"}))
        .await;
    record.assert_status_ok();
    let recorded: serde_json::Value = record.json();
    assert!(recorded["entryId"].as_str().is_some(), "expected a server-assigned entryId");

    let listed = server.get("/history").add_header("Authorization", auth_header).await;
    listed.assert_status_ok();
    let entries: Vec<serde_json::Value> = listed.json();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["videoId"], "abc123");
}

#[tokio::test]
async fn search_rejects_an_invalid_bearer_before_touching_any_upstream() {
    let server = test_server();
    let response = server.get("/search").add_query_param("q", "test").add_header("Authorization", "Bearer not-a-real-jwt").await;
    response.assert_status(StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn trending_rejects_an_invalid_bearer_before_touching_any_upstream() {
    let server = test_server();
    let response = server.get("/trending").add_header("Authorization", "Bearer not-a-real-jwt").await;
    response.assert_status(StatusCode::FORBIDDEN);
}
