// ABOUTME: One-time handoff token store with atomic validate-and-consume
// ABOUTME: Creates random token records and redeems each exactly once
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # Handoff token store
//!
//! The store exclusively owns [`HandoffTokenRecord`]s: it creates them at
//! login success and consumes each at most once at verify time. Nothing
//! else mutates a record. Consumption is delegated to the database backend
//! as a single atomic transaction, so concurrent redemption attempts for
//! the same record yield exactly one success.

use crate::constants::limits;
use crate::crypto;
use crate::database_plugins::{factory::Database, DatabaseProvider};
use crate::errors::{AppError, AppResult, TokenError, VerifyError};
use crate::models::{HandoffConsumeOutcome, HandoffTokenRecord};
use chrono::{Duration, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Durable store of one-time handoff tokens
#[derive(Clone)]
pub struct TokenStore {
    database: Arc<Database>,
}

impl TokenStore {
    /// Create a store over the given database
    #[must_use]
    pub const fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Create and persist a fresh handoff record for (user, app).
    ///
    /// The token string and nonce are independently random: 256 and 128
    /// bits respectively, so collisions are negligible and record
    /// enumeration is infeasible.
    ///
    /// # Errors
    /// Returns a storage error if persistence fails.
    pub async fn create(
        &self,
        user_id: Uuid,
        client_app_id: Uuid,
        ttl: Duration,
    ) -> AppResult<HandoffTokenRecord> {
        let now = Utc::now();
        let record = HandoffTokenRecord {
            token: crypto::random_urlsafe(limits::HANDOFF_TOKEN_BYTES),
            user_id,
            client_app_id,
            nonce: crypto::random_urlsafe(limits::HANDOFF_NONCE_BYTES),
            created_at: now,
            expires_at: now + ttl,
            used: false,
        };

        self.database
            .create_handoff_token(&record)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        Ok(record)
    }

    /// Atomically validate and consume a record, returning its (user, app).
    ///
    /// Failure order: [`TokenError::NoSuchRecord`] if the token string does
    /// not resolve, [`TokenError::NonceMismatch`] if the supplied nonce
    /// differs from the stored one, [`TokenError::AlreadyUsedOrExpired`]
    /// otherwise - including when a concurrent caller won the consume race.
    ///
    /// # Errors
    /// Token errors are terminal for the record; storage failures surface
    /// as [`VerifyError::Internal`] and are safe to retry since they occur
    /// before the consume step committed.
    pub async fn validate_and_consume(
        &self,
        token: &str,
        nonce: &str,
    ) -> Result<(Uuid, Uuid), VerifyError> {
        let outcome = self
            .database
            .consume_handoff_token(token, nonce, Utc::now())
            .await
            .map_err(|e| VerifyError::Internal(AppError::database(e.to_string())))?;

        match outcome {
            HandoffConsumeOutcome::Consumed {
                user_id,
                client_app_id,
            } => Ok((user_id, client_app_id)),
            HandoffConsumeOutcome::NoSuchRecord => Err(TokenError::NoSuchRecord.into()),
            HandoffConsumeOutcome::NonceMismatch => Err(TokenError::NonceMismatch.into()),
            HandoffConsumeOutcome::AlreadyUsedOrExpired => {
                Err(TokenError::AlreadyUsedOrExpired.into())
            }
        }
    }
}
