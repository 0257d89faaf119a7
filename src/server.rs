// ABOUTME: HTTP server assembly and shared request-handling resources
// ABOUTME: Builds the axum router over ServerResources and drives the listener
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! HTTP server assembly
//!
//! [`ServerResources`] is the dependency container shared by every handler;
//! [`SsoServer`] assembles the router and drives the listener. Each request
//! runs independently on the tokio runtime - the broker keeps no in-process
//! state between calls, so the only shared mutable resource is the database
//! behind its pool.

use crate::broker::SsoBroker;
use crate::config::environment::ServerConfig;
use crate::database_plugins::factory::Database;
use crate::routes::{ActivationRoutes, HealthRoutes, SsoRoutes};
use anyhow::Result;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Shared resources injected into every route handler
pub struct ServerResources {
    /// Database handle
    pub database: Arc<Database>,
    /// The SSO broker
    pub broker: Arc<SsoBroker>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Bundle the shared resources
    #[must_use]
    pub const fn new(
        database: Arc<Database>,
        broker: Arc<SsoBroker>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            database,
            broker,
            config,
        }
    }
}

/// The Janus SSO HTTP server
pub struct SsoServer {
    resources: Arc<ServerResources>,
}

impl SsoServer {
    /// Create a server over the shared resources
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Assemble the full application router
    #[must_use]
    pub fn router(&self) -> Router {
        Router::new()
            .merge(SsoRoutes::routes())
            .merge(ActivationRoutes::routes())
            .merge(HealthRoutes::routes())
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::clone(&self.resources))
    }

    /// Bind the configured address and serve until shutdown.
    ///
    /// # Errors
    /// Returns an error if the listener cannot bind or the server fails.
    pub async fn run(&self) -> Result<()> {
        let addr = format!(
            "{}:{}",
            self.resources.config.http_host, self.resources.config.http_port
        );
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Janus SSO Server listening on {addr}");

        axum::serve(listener, self.router()).await?;
        Ok(())
    }
}
