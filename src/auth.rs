// ABOUTME: Credential verification at the identity-store seam
// ABOUTME: Defines the Authenticator trait and the bcrypt-backed password authenticator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # Credential verification
//!
//! The broker consumes an already-provisioned identity store; it verifies
//! credentials but never creates or rotates them. [`Authenticator`] is the
//! seam: the broker only sees "these credentials resolve to this user, or
//! they do not". Unknown user, wrong password, and inactive account are
//! deliberately indistinguishable to the caller.

use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult};
use crate::models::User;
use async_trait::async_trait;
use std::sync::Arc;

/// Verifies request credentials against the identity store
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Resolve credentials to a user.
    ///
    /// Returns `Ok(None)` for every user-correctable failure - unknown
    /// user, wrong password, inactive account - without distinguishing
    /// between them.
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>>;
}

/// Password authenticator backed by the user store's bcrypt hashes
pub struct PasswordAuthenticator {
    database: Arc<Database>,
    /// Hash verified when the user is unknown, so both paths cost one
    /// bcrypt verification
    dummy_hash: String,
}

impl PasswordAuthenticator {
    /// Create an authenticator over the given user store.
    ///
    /// # Errors
    /// Returns an error if the timing-pad hash cannot be generated.
    pub fn new(database: Arc<Database>) -> AppResult<Self> {
        let dummy_hash = bcrypt::hash("janus.timing.pad", bcrypt::DEFAULT_COST)
            .map_err(|e| AppError::internal(format!("failed to generate timing pad: {e}")))?;
        Ok(Self {
            database,
            dummy_hash,
        })
    }
}

#[async_trait]
impl Authenticator for PasswordAuthenticator {
    async fn authenticate(&self, username: &str, password: &str) -> AppResult<Option<User>> {
        let user = self
            .database
            .get_user_by_username(username)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        let hash = user
            .as_ref()
            .map_or_else(|| self.dummy_hash.clone(), |u| u.password_hash.clone());

        // Verify on the blocking pool; bcrypt is deliberately slow
        let password = password.to_owned();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(&password, &hash))
            .await
            .map_err(|e| AppError::internal(format!("password verification task failed: {e}")))?
            .unwrap_or(false);

        match user {
            Some(u) if matches && u.is_active => Ok(Some(u)),
            _ => Ok(None),
        }
    }
}
