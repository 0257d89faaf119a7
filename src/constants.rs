// ABOUTME: Application constants shared across modules and binaries
// ABOUTME: Centralizes limits, signing domains, environment variable names, and defaults
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Application constants for the Janus SSO Server

/// Numeric limits and entropy widths
pub mod limits {
    /// Default lifetime of an SSO handoff token. Handoff tokens are redeemed
    /// within one redirect round-trip, so minutes, never hours.
    pub const SSO_TOKEN_TTL_SECS: u64 = 300;

    /// Default lifetime of an activation continuation token (48 hours).
    pub const ACTIVATION_TOKEN_TTL_SECS: u64 = 60 * 60 * 48;

    /// Minimum accepted signing key length in bytes.
    pub const MIN_SIGNING_KEY_BYTES: usize = 32;

    /// Length of a generated signing key when none is configured.
    pub const GENERATED_SIGNING_KEY_BYTES: usize = 64;

    /// Random width of the opaque handoff token string (256 bits).
    pub const HANDOFF_TOKEN_BYTES: usize = 32;

    /// Random width of the per-record nonce (128 bits).
    pub const HANDOFF_NONCE_BYTES: usize = 16;
}

/// Signing domain salts. The SSO and activation domains must never share a
/// key; the salt additionally separates the MAC input per domain.
pub mod signing_domains {
    /// SSO handoff envelope domain
    pub const SSO_HANDOFF: &str = "sso.handoff";

    /// Account activation continuation domain
    pub const ACTIVATION: &str = "accounts.activation";
}

/// Environment variable names
pub mod env_config {
    /// Database connection string
    pub const DATABASE_URL: &str = "DATABASE_URL";

    /// HTTP listen port
    pub const HTTP_PORT: &str = "HTTP_PORT";

    /// HTTP bind address
    pub const HTTP_HOST: &str = "HTTP_HOST";

    /// Signing key for SSO handoff envelopes
    pub const SSO_SIGNING_KEY: &str = "SSO_SIGNING_KEY";

    /// Signing key for activation continuation envelopes
    pub const ACTIVATION_SIGNING_KEY: &str = "ACTIVATION_SIGNING_KEY";

    /// SSO handoff token TTL in seconds
    pub const SSO_TOKEN_TTL_SECS: &str = "SSO_TOKEN_TTL_SECS";

    /// Activation token TTL in seconds
    pub const ACTIVATION_TOKEN_TTL_SECS: &str = "ACTIVATION_TOKEN_TTL_SECS";

    /// External OAuth2 authorize endpoint for activation continuation
    pub const OAUTH_AUTHORIZE_URL: &str = "OAUTH_AUTHORIZE_URL";

    /// Log output format (json, pretty, compact)
    pub const LOG_FORMAT: &str = "LOG_FORMAT";
}

/// Default configuration values
pub mod defaults {
    /// Default HTTP listen port
    pub const HTTP_PORT: u16 = 8081;

    /// Default HTTP bind address
    pub const HTTP_HOST: &str = "127.0.0.1";

    /// Default database location
    pub const DATABASE_URL: &str = "sqlite:data/janus.db";

    /// Default external OAuth2 authorize endpoint
    pub const OAUTH_AUTHORIZE_URL: &str = "http://localhost:9000/oauth2/authorize";
}

/// Service names used in logging and health output
pub mod service_names {
    /// The SSO broker service
    pub const JANUS_SSO_SERVER: &str = "janus-sso-server";
}

/// Wire-format error kinds returned by the verify endpoint. Surfaced
/// verbatim; clients match on these strings.
pub mod token_error_kinds {
    /// No token supplied in the request
    pub const MISSING_TOKEN: &str = "missing_token";

    /// Envelope signature valid but past its TTL
    pub const TOKEN_EXPIRED: &str = "token_expired";

    /// Envelope malformed or signature verification failed
    pub const BAD_TOKEN: &str = "bad_token";

    /// Envelope verified but no matching store record
    pub const NO_RECORD: &str = "no_record";

    /// Envelope nonce does not match the stored record nonce
    pub const NONCE_MISMATCH: &str = "nonce_mismatch";

    /// Record already redeemed or past its expiry
    pub const INVALID_OR_USED: &str = "invalid_or_used";
}
