// ABOUTME: Tests for the activation continuation flow
// ABOUTME: Validates account activation, redirect allow-list enforcement, and state forwarding
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use axum::body::Body;
use http::header::LOCATION;
use http::{Request, StatusCode};
use janus_sso_server::database_plugins::DatabaseProvider;
use janus_sso_server::models::ActivationEnvelope;
use std::sync::Arc;
use url::Url;
use uuid::Uuid;

fn activate_request(token: &str) -> Request<Body> {
    Request::builder()
        .uri(format!("/activate/{token}"))
        .body(Body::empty())
        .unwrap()
}

#[tokio::test]
async fn test_activation_redirects_into_authorize_endpoint() {
    let database = common::create_test_database().await.unwrap();
    let user = common::create_inactive_user(&database, "frank").await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let broker = common::create_test_broker(Arc::clone(&database)).unwrap();
    let (router, _) = common::create_test_server(Arc::clone(&database)).unwrap();

    let token = broker
        .make_activation_token(&ActivationEnvelope {
            user_id: user.id,
            client_id: Some("app1".into()),
            redirect_uri: Some("https://client.example/cb".into()),
            state: Some("xyz-state".into()),
        })
        .unwrap();

    let response = tower::ServiceExt::oneshot(router, activate_request(&token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let location = response.headers().get(LOCATION).unwrap().to_str().unwrap();
    let url = Url::parse(location).unwrap();
    assert!(location.starts_with("http://localhost:9000/oauth2/authorize?"));

    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert!(pairs.contains(&("response_type".into(), "code".into())));
    assert!(pairs.contains(&("client_id".into(), "app1".into())));
    assert!(pairs.contains(&("redirect_uri".into(), "https://client.example/cb".into())));
    // state forwarded unchanged
    assert!(pairs.contains(&("state".into(), "xyz-state".into())));

    // The account is now active
    let user = database.get_user(user.id).await.unwrap().unwrap();
    assert!(user.is_active);
}

#[tokio::test]
async fn test_activation_rejects_unlisted_redirect_uri() {
    let database = common::create_test_database().await.unwrap();
    let user = common::create_inactive_user(&database, "frank").await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let broker = common::create_test_broker(Arc::clone(&database)).unwrap();
    let (router, _) = common::create_test_server(Arc::clone(&database)).unwrap();

    let token = broker
        .make_activation_token(&ActivationEnvelope {
            user_id: user.id,
            client_id: Some("app1".into()),
            redirect_uri: Some("https://evil.example/steal".into()),
            state: None,
        })
        .unwrap();

    let response = tower::ServiceExt::oneshot(router, activate_request(&token))
        .await
        .unwrap();

    // Fails closed: 400-class response, no redirect issued
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(LOCATION).is_none());
}

#[tokio::test]
async fn test_activation_without_continuation_parameters() {
    let database = common::create_test_database().await.unwrap();
    let user = common::create_inactive_user(&database, "frank").await.unwrap();
    let broker = common::create_test_broker(Arc::clone(&database)).unwrap();
    let (router, _) = common::create_test_server(Arc::clone(&database)).unwrap();

    let token = broker
        .make_activation_token(&ActivationEnvelope {
            user_id: user.id,
            client_id: None,
            redirect_uri: None,
            state: None,
        })
        .unwrap();

    let response = tower::ServiceExt::oneshot(router, activate_request(&token))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let user = database.get_user(user.id).await.unwrap().unwrap();
    assert!(user.is_active);
}

#[tokio::test]
async fn test_activation_is_idempotent_and_enables_login() {
    let database = common::create_test_database().await.unwrap();
    let user = common::create_inactive_user(&database, "frank").await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let broker = common::create_test_broker(Arc::clone(&database)).unwrap();

    let envelope = ActivationEnvelope {
        user_id: user.id,
        client_id: None,
        redirect_uri: None,
        state: None,
    };
    let token = broker.make_activation_token(&envelope).unwrap();

    // Activating twice is fine; the flag is monotonic
    broker.activate_and_continue(&token).await.unwrap();
    broker.activate_and_continue(&token).await.unwrap();

    // The account can now log in
    let outcome = broker
        .login(janus_sso_server::broker::LoginRequest {
            client_id: Some("app1".into()),
            return_url: Some("https://client.example/cb".into()),
            username: "frank".into(),
            password: common::TEST_PASSWORD.into(),
        })
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        janus_sso_server::broker::LoginOutcome::Redirect(_)
    ));
}

#[tokio::test]
async fn test_activation_rejects_garbage_and_unknown_user() {
    let database = common::create_test_database().await.unwrap();
    let broker = common::create_test_broker(Arc::clone(&database)).unwrap();
    let (router, _) = common::create_test_server(Arc::clone(&database)).unwrap();

    let response = tower::ServiceExt::oneshot(router, activate_request("not-a-real-token"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // A verifiable envelope naming a user that does not exist is a
    // dangling reference, not a silent success
    let token = broker
        .make_activation_token(&ActivationEnvelope {
            user_id: Uuid::new_v4(),
            client_id: None,
            redirect_uri: None,
            state: None,
        })
        .unwrap();
    let err = broker.activate_and_continue(&token).await.unwrap_err();
    assert_eq!(err.code, janus_sso_server::errors::ErrorCode::ResourceNotFound);
}

#[tokio::test]
async fn test_handoff_token_is_not_an_activation_token() {
    let database = common::create_test_database().await.unwrap();
    common::create_test_user(&database, "alice").await.unwrap();
    common::create_test_app(&database).await.unwrap();
    let broker = common::create_test_broker(Arc::clone(&database)).unwrap();

    // Obtain a genuine SSO handoff token via login
    let outcome = broker
        .login(janus_sso_server::broker::LoginRequest {
            client_id: Some("app1".into()),
            return_url: Some("https://client.example/cb".into()),
            username: "alice".into(),
            password: common::TEST_PASSWORD.into(),
        })
        .await
        .unwrap();
    let janus_sso_server::broker::LoginOutcome::Redirect(target) = outcome else {
        panic!("expected redirect");
    };
    let url = Url::parse(&target).unwrap();
    let token = url
        .query_pairs()
        .find(|(key, _)| key == "token")
        .map(|(_, value)| value.into_owned())
        .unwrap();

    // The signing domains are isolated: an SSO envelope is worthless at the
    // activation endpoint
    let err = broker.activate_and_continue(&token).await.unwrap_err();
    assert_eq!(err.code, janus_sso_server::errors::ErrorCode::InvalidInput);
}
