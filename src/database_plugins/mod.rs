// ABOUTME: Database abstraction layer for the Janus SSO Server
// ABOUTME: Plugin architecture with SQLite and PostgreSQL backends behind one trait
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Database abstraction layer.
//!
//! All backends implement [`DatabaseProvider`] so the broker, registry, and
//! token store stay storage-agnostic. Repository methods return fully
//! materialized values; nothing is lazily loaded.

use crate::models::{ClientApp, HandoffConsumeOutcome, HandoffTokenRecord, Role, User};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

pub mod factory;
pub mod sqlite;

#[cfg(feature = "postgresql")]
pub mod postgres;

/// Core database abstraction trait
///
/// All database implementations must implement this trait to provide a
/// consistent interface for the application layer.
#[async_trait]
pub trait DatabaseProvider: Send + Sync + Clone {
    /// Create a new database connection
    async fn new(database_url: &str) -> Result<Self>
    where
        Self: Sized;

    /// Run database migrations to set up schema
    async fn migrate(&self) -> Result<()>;

    // ================================
    // Users
    // ================================

    /// Create a new user record
    async fn create_user(&self, user: &User) -> Result<Uuid>;

    /// Get user by ID
    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>>;

    /// Get user by login name
    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// Flip a user's active flag (idempotent)
    async fn set_user_active(&self, user_id: Uuid, active: bool) -> Result<()>;

    /// Get total number of users
    async fn get_user_count(&self) -> Result<i64>;

    // ================================
    // Client Applications
    // ================================

    /// Register a client application
    async fn create_client_app(&self, app: &ClientApp) -> Result<Uuid>;

    /// Get a client application by its internal ID
    async fn get_client_app(&self, id: Uuid) -> Result<Option<ClientApp>>;

    /// Get a client application by its public client identifier
    async fn get_client_app_by_client_id(&self, client_id: &str) -> Result<Option<ClientApp>>;

    // ================================
    // Roles & Assignments
    // ================================

    /// Fetch a role by name, creating it if absent
    async fn get_or_create_role(&self, name: &str, description: &str) -> Result<Role>;

    /// Assign a role to a user within one app's context; duplicate
    /// (user, app, role) triples are ignored
    async fn assign_role(&self, user_id: Uuid, client_app_id: Uuid, role_id: Uuid) -> Result<()>;

    /// Role names held by a user within one app's context
    async fn role_names_for_user_app(
        &self,
        user_id: Uuid,
        client_app_id: Uuid,
    ) -> Result<Vec<String>>;

    // ================================
    // Handoff Tokens
    // ================================

    /// Persist a freshly created handoff token record
    async fn create_handoff_token(&self, record: &HandoffTokenRecord) -> Result<()>;

    /// Fetch a handoff token record by its opaque token string
    async fn get_handoff_token(&self, token: &str) -> Result<Option<HandoffTokenRecord>>;

    /// Total number of handoff token records
    async fn count_handoff_tokens(&self) -> Result<i64>;

    /// Atomically validate and consume a handoff token record.
    ///
    /// Runs as a single transaction: resolve the record, compare the nonce
    /// in constant time, check validity, then flip `used` with a conditional
    /// update so concurrent callers observe exactly one success. The flag is
    /// monotonic; no failure path leaves a record partially consumed.
    async fn consume_handoff_token(
        &self,
        token: &str,
        nonce: &str,
        now: DateTime<Utc>,
    ) -> Result<HandoffConsumeOutcome>;
}
