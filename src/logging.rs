// ABOUTME: Logging configuration and structured logging setup for observability
// ABOUTME: Configures log levels, formatters, and output destinations via environment
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! Production-ready logging configuration with structured output

use crate::constants::{env_config, service_names};
use anyhow::Result;
use std::env;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Env-filter directive string (`RUST_LOG` syntax)
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: format!("info,{}=info", env!("CARGO_CRATE_NAME")),
            format: LogFormat::Pretty,
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let filter = env::var("RUST_LOG").unwrap_or_else(|_| Self::default().filter);

        let format = match env::var(env_config::LOG_FORMAT).as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        Self { filter, format }
    }

    /// Install the global tracing subscriber for this configuration.
    ///
    /// # Errors
    /// Returns an error if a subscriber is already installed or the filter
    /// directive fails to parse.
    pub fn init(&self) -> Result<()> {
        let filter = EnvFilter::try_new(&self.filter)?;
        let registry = tracing_subscriber::registry().with(filter);

        match self.format {
            LogFormat::Json => registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()?,
            LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
            LogFormat::Compact => registry
                .with(tracing_subscriber::fmt::layer().compact())
                .try_init()?,
        }

        tracing::info!(
            service = service_names::JANUS_SSO_SERVER,
            format = ?self.format,
            "logging initialized"
        );
        Ok(())
    }
}

/// Initialize logging from environment variables.
///
/// # Errors
/// Returns an error if subscriber installation fails.
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_pretty_info() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.filter.starts_with("info"));
    }
}
