// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: Provides common database, broker, and seeding helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org
#![allow(
    dead_code,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::module_name_repetitions
)]

//! Shared test utilities for `janus_sso_server`
//!
//! Common setup functions to reduce duplication across integration tests.

use anyhow::Result;
use janus_sso_server::{
    auth::PasswordAuthenticator,
    broker::SsoBroker,
    config::environment::{DatabaseConfig, ServerConfig, SsoConfig},
    database_plugins::{factory::Database, DatabaseProvider},
    models::{ClientApp, User},
    server::{ServerResources, SsoServer},
};
use std::sync::{Arc, Once};
use uuid::Uuid;

/// Password shared by all seeded test users
pub const TEST_PASSWORD: &str = "Pass1234!";

/// Low bcrypt cost to keep test setup fast
pub const TEST_BCRYPT_COST: u32 = 4;

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::WARN)
            .with_test_writer()
            .init();
    });
}

/// Broker configuration with fixed per-domain test keys
pub fn test_sso_config() -> SsoConfig {
    SsoConfig {
        sso_signing_key: b"test-sso-signing-key-0123456789abcdef".to_vec(),
        activation_signing_key: b"test-activation-signing-key-0123456789".to_vec(),
        sso_token_ttl_secs: 300,
        activation_token_ttl_secs: 172_800,
        authorize_url: "http://localhost:9000/oauth2/authorize".into(),
    }
}

/// Full server configuration for router tests
pub fn test_server_config() -> ServerConfig {
    ServerConfig {
        http_port: 0,
        http_host: "127.0.0.1".into(),
        database: DatabaseConfig {
            url: "sqlite::memory:".into(),
        },
        sso: test_sso_config(),
    }
}

/// Standard test database setup
pub async fn create_test_database() -> Result<Arc<Database>> {
    init_test_logging();
    Ok(Arc::new(Database::new("sqlite::memory:").await?))
}

/// Create an active user with the shared test password
pub async fn create_test_user(database: &Database, username: &str) -> Result<User> {
    let hash = bcrypt::hash(TEST_PASSWORD, TEST_BCRYPT_COST)?;
    let mut user = User::new(username, format!("{username}@example.com"), hash);
    user.first_name = "Test".into();
    user.last_name = "User".into();
    database.create_user(&user).await?;
    Ok(user)
}

/// Create a user that has not been activated yet
pub async fn create_inactive_user(database: &Database, username: &str) -> Result<User> {
    let hash = bcrypt::hash(TEST_PASSWORD, TEST_BCRYPT_COST)?;
    let mut user = User::new(username, format!("{username}@example.com"), hash);
    user.is_active = false;
    database.create_user(&user).await?;
    Ok(user)
}

/// Register the standard test client app (`app1`)
pub async fn create_test_app(database: &Database) -> Result<ClientApp> {
    create_test_app_named(database, "app1", "https://client.example").await
}

/// Register a client app with a custom client id and origin
pub async fn create_test_app_named(
    database: &Database,
    client_id: &str,
    origin: &str,
) -> Result<ClientApp> {
    let app = ClientApp {
        id: Uuid::new_v4(),
        name: client_id.to_owned(),
        client_id: client_id.to_owned(),
        allowed_origin: origin.to_owned(),
        redirect_uris: format!("{origin}/cb {origin}/oauth/return"),
        created_at: chrono::Utc::now(),
    };
    database.create_client_app(&app).await?;
    Ok(app)
}

/// Grant `role_name` to the user within the app's context
pub async fn grant_role(
    database: &Database,
    user: &User,
    app: &ClientApp,
    role_name: &str,
) -> Result<()> {
    let role = database.get_or_create_role(role_name, "").await?;
    database.assign_role(user.id, app.id, role.id).await?;
    Ok(())
}

/// Create a broker over the given database with test configuration
pub fn create_test_broker(database: Arc<Database>) -> Result<Arc<SsoBroker>> {
    let authenticator = Arc::new(PasswordAuthenticator::new(Arc::clone(&database))?);
    Ok(Arc::new(SsoBroker::new(
        database,
        authenticator,
        &test_sso_config(),
    )))
}

/// Build the full application router plus its shared resources
pub fn create_test_server(
    database: Arc<Database>,
) -> Result<(axum::Router, Arc<ServerResources>)> {
    let broker = create_test_broker(Arc::clone(&database))?;
    let resources = Arc::new(ServerResources::new(
        database,
        broker,
        Arc::new(test_server_config()),
    ));
    let router = SsoServer::new(Arc::clone(&resources)).router();
    Ok((router, resources))
}
