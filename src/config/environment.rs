// ABOUTME: Environment configuration management for deployment-specific settings
// ABOUTME: Parses listen address, database URL, signing keys, and token TTLs from env vars
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Environment-based configuration management

use crate::constants::{defaults, env_config, limits};
use anyhow::{bail, Context, Result};
use std::env;
use tracing::warn;

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection string; `sqlite:` and `postgresql://` URLs are supported
    pub url: String,
}

/// SSO broker configuration: signing keys, TTLs, and the external
/// authorize endpoint used by the activation continuation.
#[derive(Clone)]
pub struct SsoConfig {
    /// Signing key for the SSO handoff domain
    pub sso_signing_key: Vec<u8>,
    /// Signing key for the activation domain; must differ from the SSO key
    pub activation_signing_key: Vec<u8>,
    /// Handoff token lifetime in seconds
    pub sso_token_ttl_secs: u64,
    /// Activation token lifetime in seconds
    pub activation_token_ttl_secs: u64,
    /// External OAuth2 authorize endpoint
    pub authorize_url: String,
}

impl SsoConfig {
    /// Handoff token TTL as a chrono duration
    // Safe: TTLs are small positive configuration values
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn sso_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.sso_token_ttl_secs as i64)
    }

    /// Activation token TTL as a chrono duration
    // Safe: TTLs are small positive configuration values
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn activation_token_ttl(&self) -> chrono::Duration {
        chrono::Duration::seconds(self.activation_token_ttl_secs as i64)
    }
}

impl std::fmt::Debug for SsoConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SsoConfig")
            .field("sso_signing_key", &"<redacted>")
            .field("activation_signing_key", &"<redacted>")
            .field("sso_token_ttl_secs", &self.sso_token_ttl_secs)
            .field("activation_token_ttl_secs", &self.activation_token_ttl_secs)
            .field("authorize_url", &self.authorize_url)
            .finish()
    }
}

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// HTTP listen port
    pub http_port: u16,
    /// HTTP bind address
    pub http_host: String,
    /// Database settings
    pub database: DatabaseConfig,
    /// Broker settings
    pub sso: SsoConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to
    /// development defaults where safe.
    ///
    /// # Errors
    /// Returns an error if a variable is present but unparseable, if a
    /// configured signing key is too short, or if the two signing domains
    /// share a key.
    pub fn from_env() -> Result<Self> {
        let http_port = match env::var(env_config::HTTP_PORT) {
            Ok(value) => value
                .parse::<u16>()
                .with_context(|| format!("invalid {}: {value}", env_config::HTTP_PORT))?,
            Err(_) => defaults::HTTP_PORT,
        };

        let http_host =
            env::var(env_config::HTTP_HOST).unwrap_or_else(|_| defaults::HTTP_HOST.into());

        let database = DatabaseConfig {
            url: env::var(env_config::DATABASE_URL)
                .unwrap_or_else(|_| defaults::DATABASE_URL.into()),
        };

        let sso_signing_key = signing_key_from_env(env_config::SSO_SIGNING_KEY)?;
        let activation_signing_key = signing_key_from_env(env_config::ACTIVATION_SIGNING_KEY)?;
        if sso_signing_key == activation_signing_key {
            bail!(
                "{} and {} must not share a key: compromise of one signing \
                 domain would forge the other",
                env_config::SSO_SIGNING_KEY,
                env_config::ACTIVATION_SIGNING_KEY
            );
        }

        let sso = SsoConfig {
            sso_signing_key,
            activation_signing_key,
            sso_token_ttl_secs: ttl_from_env(
                env_config::SSO_TOKEN_TTL_SECS,
                limits::SSO_TOKEN_TTL_SECS,
            )?,
            activation_token_ttl_secs: ttl_from_env(
                env_config::ACTIVATION_TOKEN_TTL_SECS,
                limits::ACTIVATION_TOKEN_TTL_SECS,
            )?,
            authorize_url: env::var(env_config::OAUTH_AUTHORIZE_URL)
                .unwrap_or_else(|_| defaults::OAUTH_AUTHORIZE_URL.into()),
        };

        Ok(Self {
            http_port,
            http_host,
            database,
            sso,
        })
    }

    /// One-line startup summary for logging; never includes key material
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "listen={}:{} database={} sso_ttl={}s activation_ttl={}s authorize_url={}",
            self.http_host,
            self.http_port,
            self.database.url,
            self.sso.sso_token_ttl_secs,
            self.sso.activation_token_ttl_secs,
            self.sso.authorize_url
        )
    }
}

fn ttl_from_env(name: &str, default_secs: u64) -> Result<u64> {
    match env::var(name) {
        Ok(value) => {
            let secs = value
                .parse::<u64>()
                .with_context(|| format!("invalid {name}: {value}"))?;
            if secs == 0 {
                bail!("{name} must be greater than zero");
            }
            Ok(secs)
        }
        Err(_) => Ok(default_secs),
    }
}

fn signing_key_from_env(name: &str) -> Result<Vec<u8>> {
    match env::var(name) {
        Ok(value) => {
            let key = value.into_bytes();
            if key.len() < limits::MIN_SIGNING_KEY_BYTES {
                bail!(
                    "{name} must be at least {} bytes",
                    limits::MIN_SIGNING_KEY_BYTES
                );
            }
            Ok(key)
        }
        Err(_) => {
            warn!(
                "{name} not set - generated an ephemeral signing key; \
                 tokens will not survive a restart"
            );
            crate::crypto::generate_signing_key(limits::GENERATED_SIGNING_KEY_BYTES)
        }
    }
}
