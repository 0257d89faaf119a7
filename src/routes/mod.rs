// ABOUTME: Route module organization for the Janus SSO Server HTTP endpoints
// ABOUTME: Route definitions by domain with thin handlers delegating to the broker
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Route modules for the Janus SSO Server
//!
//! Each domain module contains only route definitions and thin handler
//! functions that delegate to the broker.

/// Activation continuation routes
pub mod activation;
/// Health check and system status routes
pub mod health;
/// SSO login and verify routes
pub mod sso;

/// Activation route handlers
pub use activation::ActivationRoutes;
/// Health check route handlers
pub use health::HealthRoutes;
/// SSO route handlers
pub use sso::SsoRoutes;
