// ABOUTME: Server binary for the Janus SSO token broker
// ABOUTME: Loads configuration, initializes the database, and serves the HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # Janus SSO Server Binary
//!
//! Starts the SSO token broker with environment-based configuration,
//! database migrations, and structured logging.

use anyhow::Result;
use clap::Parser;
use janus_sso_server::{
    auth::PasswordAuthenticator,
    broker::SsoBroker,
    config::environment::ServerConfig,
    database_plugins::{factory::Database, DatabaseProvider},
    logging,
    server::{ServerResources, SsoServer},
};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "janus-sso-server")]
#[command(about = "Janus SSO Server - single sign-on handoff token broker")]
struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database.url = database_url;
    }

    logging::init_from_env()?;

    info!("Starting Janus SSO Server");
    info!("{}", config.summary());

    let database = Arc::new(Database::new(&config.database.url).await?);
    info!("Database initialized successfully: {}", database.backend_info());

    let authenticator = Arc::new(PasswordAuthenticator::new(Arc::clone(&database))?);

    let config = Arc::new(config);
    let broker = Arc::new(SsoBroker::new(
        Arc::clone(&database),
        authenticator,
        &config.sso,
    ));

    let resources = Arc::new(ServerResources::new(database, broker, config));
    SsoServer::new(resources).run().await
}
