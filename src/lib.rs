// ABOUTME: Main library entry point for the Janus SSO token broker
// ABOUTME: Issues short-lived single-use handoff tokens and redeems them for identity claims
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

#![deny(unsafe_code)]

//! # Janus SSO Server
//!
//! A single-sign-on token broker: after a user authenticates, Janus issues a
//! short-lived, single-use handoff token bound to one registered client
//! application. The client redeems that token exactly once for verified
//! identity and role claims.
//!
//! ## Guarantees
//!
//! - **Exactly-once redemption**: concurrent verify calls for the same token
//!   yield one success; all others fail.
//! - **App binding**: a token issued for one client application cannot be
//!   replayed against another.
//! - **TTL enforcement**: both the signed envelope and the stored record
//!   expire independently.
//! - **Forgery resistance**: envelopes are HMAC-signed with per-domain keys.
//!
//! ## Architecture
//!
//! - **Broker**: orchestrates login, token issuance, and verification
//! - **`TokenStore`**: durable one-time token records with atomic consumption
//! - **Crypto**: tamper-evident signed envelopes with TTL
//! - **Registry**: registered client applications and redirect allow-lists
//! - **Database plugins**: SQLite and PostgreSQL backends behind one trait
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use janus_sso_server::config::environment::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Janus SSO Server configured with port: HTTP={}", config.http_port);
//!     Ok(())
//! }
//! ```

/// Credential verification at the identity-store seam
pub mod auth;

/// SSO broker orchestration: login, verify, activation continuation
pub mod broker;

/// Configuration management and environment parsing
pub mod config;

/// Application constants and configuration values
pub mod constants;

/// Signed-envelope codecs and random token material
pub mod crypto;

/// Database abstraction layer with plugin support
pub mod database_plugins;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Structured logging configuration
pub mod logging;

/// Core data models
pub mod models;

/// Client application registry
pub mod registry;

/// HTTP routes
pub mod routes;

/// HTTP server assembly and shared resources
pub mod server;

/// One-time handoff token store
pub mod token_store;
