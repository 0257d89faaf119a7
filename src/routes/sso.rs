// ABOUTME: SSO login and verify route handlers
// ABOUTME: Renders the login form, issues handoff redirects, and redeems tokens for claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! SSO routes: login form, login submission, and token verification
//!
//! The verify endpoint accepts the token either as a form field or as a
//! JSON body field, and surfaces failures as opaque machine-readable kinds
//! with a 400 status.

use crate::broker::{LoginOutcome, LoginRequest};
use crate::errors::{AppError, AppResult, VerifyError};
use crate::server::ServerResources;
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use http::header::CONTENT_TYPE;
use http::{HeaderMap, StatusCode};
use serde::Deserialize;
use std::sync::Arc;

/// Query parameters carried through the login flow
#[derive(Debug, Deserialize)]
pub struct LoginQuery {
    /// Public client identifier of the relying app
    pub client_id: Option<String>,
    /// Callback URL the client expects the token on
    pub next: Option<String>,
}

/// Login form submission
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    /// Login name
    pub username: String,
    /// Password
    pub password: String,
    /// Client identifier, carried as a hidden field
    pub client_id: Option<String>,
    /// Callback URL, carried as a hidden field
    pub next: Option<String>,
}

/// SSO routes implementation
pub struct SsoRoutes;

impl SsoRoutes {
    /// Create the SSO login and verify routes
    pub fn routes() -> Router<Arc<ServerResources>> {
        Router::new()
            .route("/sso/login", get(login_form).post(login_submit))
            .route("/sso/verify", post(verify))
    }
}

fn render_login_form(client_id: &str, next: &str, error: Option<&str>) -> String {
    let client_id = html_escape::encode_double_quoted_attribute(client_id);
    let next = html_escape::encode_double_quoted_attribute(next);
    let error_block = error.map_or_else(String::new, |message| {
        format!(
            "<p class=\"error\">{}</p>\n",
            html_escape::encode_text(message)
        )
    });

    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>Sign in</title></head>
<body>
<h1>Sign in</h1>
{error_block}<form method="post" action="/sso/login">
  <input type="hidden" name="client_id" value="{client_id}">
  <input type="hidden" name="next" value="{next}">
  <label>Username <input type="text" name="username" autofocus></label>
  <label>Password <input type="password" name="password"></label>
  <button type="submit">Sign in</button>
</form>
</body>
</html>
"#
    )
}

/// GET /sso/login - render the login form for a known client
async fn login_form(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<LoginQuery>,
) -> AppResult<Html<String>> {
    let client_id = query
        .client_id
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing_param("client_id"))?;
    let next = query
        .next
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::missing_param("next"))?;

    resources
        .broker
        .client_app(&client_id)
        .await?
        .ok_or_else(|| AppError::invalid_input(format!("Unknown client_id: {client_id}")))?;

    Ok(Html(render_login_form(&client_id, &next, None)))
}

/// POST /sso/login - authenticate and redirect with a handoff token
async fn login_submit(
    State(resources): State<Arc<ServerResources>>,
    Query(query): Query<LoginQuery>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    // Hidden form fields take precedence; query parameters cover clients
    // that POST directly to the login URL they were given.
    let client_id = form.client_id.or(query.client_id);
    let next = form.next.or(query.next);

    let request = LoginRequest {
        client_id: client_id.clone(),
        return_url: next.clone(),
        username: form.username,
        password: form.password,
    };

    match resources.broker.login(request).await? {
        LoginOutcome::Redirect(target) => Ok(Redirect::to(&target).into_response()),
        LoginOutcome::InvalidCredentials => {
            let page = render_login_form(
                client_id.as_deref().unwrap_or_default(),
                next.as_deref().unwrap_or_default(),
                Some("Invalid credentials"),
            );
            Ok(Html(page).into_response())
        }
    }
}

/// POST /sso/verify - redeem a handoff token for identity claims
async fn verify(
    State(resources): State<Arc<ServerResources>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let token = extract_token(&headers, &body);

    match resources.broker.verify(token.as_deref()).await {
        Ok(claims) => Json(claims).into_response(),
        Err(VerifyError::Token(e)) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({ "error": e.kind() })),
        )
            .into_response(),
        Err(VerifyError::Internal(e)) => e.into_response(),
    }
}

/// Pull the token out of a form or JSON body, depending on content type
fn extract_token(headers: &HeaderMap, body: &Bytes) -> Option<String> {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if content_type.starts_with("application/json") {
        let value: serde_json::Value = serde_json::from_slice(body).ok()?;
        value.get("token")?.as_str().map(ToOwned::to_owned)
    } else {
        url::form_urlencoded::parse(body)
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
    }
}
