// ABOUTME: Core data models for the Janus SSO token broker
// ABOUTME: Defines User, ClientApp, Role, HandoffTokenRecord and the wire claim types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # Data Models
//!
//! Core data structures used throughout the Janus SSO Server.
//!
//! ## Design Principles
//!
//! - **Explicitly materialized**: repositories return fully-loaded values;
//!   there is no lazy relationship loading anywhere in the core.
//! - **Serializable**: wire types support JSON serialization.
//! - **Type safe**: strong typing prevents cross-entity identifier mixups.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user identity consumed from the external identity store.
///
/// The broker verifies credentials against `password_hash` but never produces
/// or rotates hashes; provisioning is an external concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    /// Unique login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Organizational department, when provisioned
    pub department: Option<String>,
    /// Bcrypt hash of the user's password
    pub password_hash: String,
    /// Whether the account has been activated
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new active user with a fresh identifier
    #[must_use]
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: email.into(),
            first_name: String::new(),
            last_name: String::new(),
            department: None,
            password_hash: password_hash.into(),
            is_active: true,
            created_at: Utc::now(),
        }
    }
}

/// A registered client application (relying app).
///
/// Immutable to the broker; rows are written by an external admin process or
/// the seeding binary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientApp {
    /// Unique identifier
    pub id: Uuid,
    /// Unique display name
    pub name: String,
    /// Unique client identifier presented on login requests
    pub client_id: String,
    /// Origin (scheme+host[:port]) the login callback URL must match
    pub allowed_origin: String,
    /// Whitespace-delimited exact-match allow-list for activation redirects
    pub redirect_uris: String,
    /// When the registration was created
    pub created_at: DateTime<Utc>,
}

impl ClientApp {
    /// Check whether `candidate` is a member of the redirect allow-list.
    ///
    /// Exact string membership, never prefix or origin matching; an empty
    /// allow-list admits nothing.
    #[must_use]
    pub fn redirect_allowed(&self, candidate: &str) -> bool {
        self.redirect_uris
            .split_whitespace()
            .any(|uri| uri == candidate)
    }
}

/// A named permission grouping, global across apps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    /// Unique identifier
    pub id: Uuid,
    /// Unique role name
    pub name: String,
    /// Free-text description
    pub description: String,
}

/// A one-time SSO handoff token record.
///
/// Valid iff `!used && now < expires_at`. The `used` flag is monotonic:
/// once set it never reverts. Exclusively owned by the token store.
#[derive(Debug, Clone)]
pub struct HandoffTokenRecord {
    /// Opaque random token string; the unique indexed lookup key
    pub token: String,
    /// Owning user
    pub user_id: Uuid,
    /// Client application this token is bound to
    pub client_app_id: Uuid,
    /// Random nonce binding the signed envelope to this record
    pub nonce: String,
    /// When the record was created
    pub created_at: DateTime<Utc>,
    /// When the record stops being redeemable
    pub expires_at: DateTime<Utc>,
    /// Whether the record has been redeemed
    pub used: bool,
}

/// Outcome of an atomic validate-and-consume attempt on a handoff record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandoffConsumeOutcome {
    /// Exactly-once success; the record is now marked used
    Consumed {
        /// Owning user of the consumed record
        user_id: Uuid,
        /// App the consumed record was bound to
        client_app_id: Uuid,
    },
    /// No record with the supplied token string
    NoSuchRecord,
    /// Record exists but the supplied nonce does not match
    NonceMismatch,
    /// Record already used, past expiry, or lost the consume race
    AlreadyUsedOrExpired,
}

/// Payload of the SSO handoff signed envelope
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HandoffEnvelope {
    /// Opaque token string identifying the store record
    pub token: String,
    /// Nonce that must match the stored record
    pub nonce: String,
}

/// Payload of the activation continuation signed envelope.
///
/// Carries the OAuth continuation parameters captured at registration time;
/// `state` is forwarded unchanged.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ActivationEnvelope {
    /// User the activation link was issued for
    pub user_id: Uuid,
    /// Client application to continue into, when captured
    pub client_id: Option<String>,
    /// Redirect URI to forward, when captured
    pub redirect_uri: Option<String>,
    /// Opaque CSRF state to forward, when captured
    pub state: Option<String>,
}

/// Identity and role claims returned on successful token verification.
///
/// Roles are scoped to the redeeming app only, never the user's global set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifiedClaims {
    /// Login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Role names held within the redeeming app's context
    pub roles: Vec<String>,
    /// Name of the redeeming app
    pub app: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_app(redirect_uris: &str) -> ClientApp {
        ClientApp {
            id: Uuid::new_v4(),
            name: "app1".into(),
            client_id: "client-1".into(),
            allowed_origin: "https://client.example".into(),
            redirect_uris: redirect_uris.into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_redirect_allowed_exact_match_only() {
        let app = test_app("https://client.example/cb https://client.example/alt");

        assert!(app.redirect_allowed("https://client.example/cb"));
        assert!(app.redirect_allowed("https://client.example/alt"));
        // Prefix of an allow-listed entry must fail closed
        assert!(!app.redirect_allowed("https://client.example/"));
        assert!(!app.redirect_allowed("https://client.example/cb/extra"));
    }

    #[test]
    fn test_redirect_allowed_empty_list_admits_nothing() {
        let app = test_app("");
        assert!(!app.redirect_allowed("https://client.example/cb"));
    }

    #[test]
    fn test_new_user_is_active_with_fresh_id() {
        let a = User::new("alice", "alice@example.com", "hash");
        let b = User::new("bob", "bob@example.com", "hash");
        assert!(a.is_active);
        assert_ne!(a.id, b.id);
    }
}
