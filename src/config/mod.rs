// ABOUTME: Configuration module organization for the Janus SSO Server
// ABOUTME: Environment-based configuration lives in the environment submodule
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Configuration management

pub mod environment;

pub use environment::{DatabaseConfig, ServerConfig, SsoConfig};
