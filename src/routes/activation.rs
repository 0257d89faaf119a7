// ABOUTME: Activation continuation route handler
// ABOUTME: Redeems signed activation tokens and forwards into the external authorize endpoint
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Activation continuation route
//!
//! The path parameter is the signed activation token. On success the
//! account is activated and, when the envelope carries OAuth continuation
//! parameters, the browser is redirected into the external authorize
//! endpoint with `state` forwarded unchanged. The authorization-code
//! exchange itself happens entirely outside this service.

use crate::broker::ActivationOutcome;
use crate::errors::AppResult;
use crate::server::ServerResources;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

/// Activation routes implementation
pub struct ActivationRoutes;

impl ActivationRoutes {
    /// Create the activation continuation route
    pub fn routes() -> Router<Arc<ServerResources>> {
        Router::new().route("/activate/:token", get(activate))
    }
}

/// GET /activate/{token} - activate the account and continue into OAuth
async fn activate(
    State(resources): State<Arc<ServerResources>>,
    Path(token): Path<String>,
) -> AppResult<Response> {
    match resources.broker.activate_and_continue(&token).await? {
        ActivationOutcome::Redirect(target) => Ok(Redirect::to(&target).into_response()),
        ActivationOutcome::Activated => {
            Ok(Json(serde_json::json!({ "status": "activated" })).into_response())
        }
    }
}
