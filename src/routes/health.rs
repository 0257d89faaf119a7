// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Provides liveness and database-backed readiness endpoints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Health check routes for service monitoring

use crate::constants::service_names;
use crate::database_plugins::DatabaseProvider;
use crate::server::ServerResources;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use std::sync::Arc;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes() -> Router<Arc<ServerResources>> {
        Router::new()
            .route("/health", get(health_handler))
            .route("/ready", get(ready_handler))
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "service": service_names::JANUS_SSO_SERVER,
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Readiness requires a live database connection
async fn ready_handler(State(resources): State<Arc<ServerResources>>) -> impl IntoResponse {
    match resources.database.get_user_count().await {
        Ok(_) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "service": service_names::JANUS_SSO_SERVER,
                "status": "ready",
                "timestamp": chrono::Utc::now().to_rfc3339()
            })),
        ),
        Err(e) => {
            tracing::warn!("readiness check failed: {e}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "service": service_names::JANUS_SSO_SERVER,
                    "status": "unavailable",
                    "timestamp": chrono::Utc::now().to_rfc3339()
                })),
            )
        }
    }
}
