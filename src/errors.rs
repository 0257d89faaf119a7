// ABOUTME: Unified error handling with standard error codes and HTTP response formatting
// ABOUTME: Defines the broker-wide AppError plus the opaque token error taxonomy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright ©2025 Async-IO.org

//! # Unified Error Handling System
//!
//! This module provides the centralized error types for the Janus SSO Server:
//! a general [`AppError`] with standard error codes and HTTP formatting, and
//! the opaque [`TokenError`] taxonomy surfaced verbatim by the verify
//! endpoint. Token errors are terminal for that token; the caller restarts
//! the login flow rather than retrying.

use crate::constants::token_error_kinds;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Standard error codes used throughout the application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    /// Authentication credentials are invalid
    #[serde(rename = "AUTH_INVALID")]
    AuthInvalid,

    /// Request input is malformed
    #[serde(rename = "INVALID_INPUT")]
    InvalidInput,

    /// A required field is missing from the request
    #[serde(rename = "MISSING_REQUIRED_FIELD")]
    MissingRequiredField,

    /// The requested resource was not found
    #[serde(rename = "RESOURCE_NOT_FOUND")]
    ResourceNotFound,

    /// Configuration error
    #[serde(rename = "CONFIG_ERROR")]
    ConfigError,

    /// Database operation failed
    #[serde(rename = "DATABASE_ERROR")]
    DatabaseError,

    /// Internal server error
    #[serde(rename = "INTERNAL_ERROR")]
    InternalError,
}

impl ErrorCode {
    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(self) -> u16 {
        match self {
            Self::InvalidInput | Self::MissingRequiredField => 400,
            Self::AuthInvalid => 401,
            Self::ResourceNotFound => 404,
            Self::ConfigError | Self::DatabaseError | Self::InternalError => 500,
        }
    }

    /// Get a user-facing description of this error
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::AuthInvalid => "The provided authentication credentials are invalid",
            Self::InvalidInput => "The provided input is invalid",
            Self::MissingRequiredField => "A required field is missing from the request",
            Self::ResourceNotFound => "The requested resource was not found",
            Self::ConfigError => "Configuration error encountered",
            Self::DatabaseError => "Database operation failed",
            Self::InternalError => "An internal server error occurred",
        }
    }
}

/// Unified error type for the application
#[derive(Debug)]
pub struct AppError {
    /// Error code
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
}

impl AppError {
    /// Create a new `AppError` with the given code and message
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Get the HTTP status code for this error
    #[must_use]
    pub const fn http_status(&self) -> u16 {
        self.code.http_status()
    }

    /// Invalid authentication
    pub fn auth_invalid(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AuthInvalid, message)
    }

    /// Invalid input
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInput, message)
    }

    /// Missing required request parameter
    pub fn missing_param(name: &str) -> Self {
        Self::new(
            ErrorCode::MissingRequiredField,
            format!("Missing required parameter: {name}"),
        )
    }

    /// Resource not found
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(
            ErrorCode::ResourceNotFound,
            format!("{} not found", resource.into()),
        )
    }

    /// Configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// Database error
    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    /// Internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.description(), self.message)
    }
}

impl std::error::Error for AppError {}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::new(ErrorCode::InternalError, error.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// HTTP error response format
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error payload
    pub error: ErrorResponseDetails,
}

/// Error payload carried in [`ErrorResponse`]
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponseDetails {
    /// Machine-readable error code
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        Self {
            error: ErrorResponseDetails {
                code: error.code,
                message: error.message,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = http::StatusCode::from_u16(self.http_status())
            .unwrap_or(http::StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(ErrorResponse::from(self))).into_response()
    }
}

/// Opaque token error taxonomy surfaced by the verify endpoint.
///
/// Every variant is terminal for the presented token and maps to a 400-class
/// response with a machine-readable kind; no internal detail is exposed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// No token present in the request
    #[error("no token supplied")]
    MissingToken,

    /// Envelope signature verified but the envelope is past its TTL
    #[error("token signature expired")]
    SignatureExpired,

    /// Envelope malformed or its signature failed verification
    #[error("token signature invalid")]
    SignatureInvalid,

    /// Envelope verified but the referenced record does not exist
    #[error("no matching token record")]
    NoSuchRecord,

    /// Supplied nonce does not match the stored record nonce
    #[error("token nonce mismatch")]
    NonceMismatch,

    /// Record already redeemed or past its stored expiry
    #[error("token already used or expired")]
    AlreadyUsedOrExpired,
}

impl TokenError {
    /// The wire-format kind for this error, surfaced verbatim to clients
    #[must_use]
    pub const fn kind(self) -> &'static str {
        match self {
            Self::MissingToken => token_error_kinds::MISSING_TOKEN,
            Self::SignatureExpired => token_error_kinds::TOKEN_EXPIRED,
            Self::SignatureInvalid => token_error_kinds::BAD_TOKEN,
            Self::NoSuchRecord => token_error_kinds::NO_RECORD,
            Self::NonceMismatch => token_error_kinds::NONCE_MISMATCH,
            Self::AlreadyUsedOrExpired => token_error_kinds::INVALID_OR_USED,
        }
    }
}

/// Failure of the verify flow: either a terminal token error reported to the
/// caller as an opaque kind, or an internal failure (storage, dangling
/// references) reported as a server error.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// Terminal token failure
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Internal failure unrelated to the presented token
    #[error(transparent)]
    Internal(#[from] AppError),
}
