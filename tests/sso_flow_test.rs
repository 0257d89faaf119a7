// ABOUTME: End-to-end HTTP tests for the SSO login and verify flows
// ABOUTME: Drives the full axum router from login form to claims redemption and replay rejection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use axum::Router;
use http::header::{CONTENT_TYPE, LOCATION};
use http::{Request, StatusCode};
use janus_sso_server::database_plugins::DatabaseProvider;
use tower::ServiceExt;
use url::Url;

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: axum::response::Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn form_request(uri: &str, fields: &[(&str, &str)]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(serde_urlencoded::to_string(fields).unwrap()))
        .unwrap()
}

async fn login(router: &Router, username: &str, password: &str) -> axum::response::Response {
    router
        .clone()
        .oneshot(form_request(
            "/sso/login",
            &[
                ("username", username),
                ("password", password),
                ("client_id", "app1"),
                ("next", "https://client.example/cb"),
            ],
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_form_renders_for_known_client() {
    let database = common::create_test_database().await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let (router, _) = common::create_test_server(database).unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/sso/login?client_id=app1&next=https://client.example/cb")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("name=\"username\""));
    assert!(page.contains("name=\"client_id\""));
}

#[tokio::test]
async fn test_login_form_missing_client_id_is_400() {
    let database = common::create_test_database().await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let (router, _) = common::create_test_server(database).unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/sso/login?next=https://client.example/cb")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_full_handoff_cycle_with_replay_rejection() {
    let database = common::create_test_database().await.unwrap();
    let user = common::create_test_user(&database, "alice").await.unwrap();
    let app = common::create_test_app(&database).await.unwrap();
    common::grant_role(&database, &user, &app, "admin").await.unwrap();
    let (router, _) = common::create_test_server(database).unwrap();

    // Login redirects to the client callback with a token attached
    let response = login(&router, "alice", common::TEST_PASSWORD).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_owned();
    assert!(location.starts_with("https://client.example/cb?token="));

    let url = Url::parse(&location).unwrap();
    let token = url
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    // First redemption returns claims
    let response = router
        .clone()
        .oneshot(form_request("/sso/verify", &[("token", &token)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let claims = body_json(response).await;
    assert_eq!(claims["username"], "alice");
    assert_eq!(claims["email"], "alice@example.com");
    assert_eq!(claims["app"], "app1");
    assert_eq!(claims["roles"], serde_json::json!(["admin"]));

    // Replay of the same token is rejected with the opaque kind
    let response = router
        .clone()
        .oneshot(form_request("/sso/verify", &[("token", &token)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = body_json(response).await;
    assert_eq!(error, serde_json::json!({ "error": "invalid_or_used" }));
}

#[tokio::test]
async fn test_verify_accepts_json_body() {
    let database = common::create_test_database().await.unwrap();
    common::create_test_user(&database, "alice").await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let (router, _) = common::create_test_server(database).unwrap();

    let response = login(&router, "alice", common::TEST_PASSWORD).await;
    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    let url = Url::parse(location).unwrap();
    let token = url
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/sso/verify")
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(
                    serde_json::json!({ "token": token }).to_string(),
                ))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let claims = body_json(response).await;
    assert_eq!(claims["username"], "alice");
}

#[tokio::test]
async fn test_verify_error_kinds_on_the_wire() {
    let database = common::create_test_database().await.unwrap();
    let (router, _) = common::create_test_server(database).unwrap();

    // No token at all
    let response = router
        .clone()
        .oneshot(form_request("/sso/verify", &[]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "missing_token" })
    );

    // Unverifiable garbage
    let response = router
        .clone()
        .oneshot(form_request("/sso/verify", &[("token", "garbage.0.sig")]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "bad_token" })
    );
}

#[tokio::test]
async fn test_login_invalid_credentials_rerenders_form() {
    let database = common::create_test_database().await.unwrap();
    common::create_test_user(&database, "alice").await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let (router, resources) = common::create_test_server(database).unwrap();

    let response = login(&router, "alice", "wrong-password").await;
    assert_eq!(response.status(), StatusCode::OK);
    let page = body_text(response).await;
    assert!(page.contains("Invalid credentials"));

    // Failed logins never create token records
    assert_eq!(resources.database.count_handoff_tokens().await.unwrap(), 0);
}

#[tokio::test]
async fn test_login_post_missing_client_id_is_400_without_side_effects() {
    let database = common::create_test_database().await.unwrap();
    common::create_test_user(&database, "alice").await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let (router, resources) = common::create_test_server(database).unwrap();

    let response = router
        .clone()
        .oneshot(form_request(
            "/sso/login",
            &[
                ("username", "alice"),
                ("password", common::TEST_PASSWORD),
                ("next", "https://client.example/cb"),
            ],
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(resources.database.count_handoff_tokens().await.unwrap(), 0);
}

#[tokio::test]
async fn test_health_and_ready_endpoints() {
    let database = common::create_test_database().await.unwrap();
    let (router, _) = common::create_test_server(database).unwrap();

    for uri in ["/health", "/ready"] {
        let response = router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
    }
}
