//! Error types for the page API client.
//!
//! # Design
//! Three failure classes are kept apart so callers can react to each:
//! a malformed page id (`ValidationError`, raised before any I/O), a server
//! rejection (`ApiError` with the HTTP status) and a transport failure that
//! outlived the retry budget (`ApiError` with `status_code == 0`).

use thiserror::Error;

/// Status code recorded on an `ApiError` when no HTTP response was received.
pub const NETWORK_ERROR_STATUS: u16 = 0;

/// A page id that is not in canonical UUID form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid page ID format. Expected UUID format, got {input:?}")]
pub struct ValidationError {
    pub input: String,
}

/// A failed API call, either rejected by the server or lost in transit.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    /// HTTP status of the rejecting response, or `0` for a network failure.
    pub status_code: u16,
    pub details: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, status_code: u16, details: Option<String>) -> Self {
        Self {
            message: message.into(),
            status_code,
            details,
        }
    }

    /// A transport failure that exhausted the retry budget.
    pub fn network(cause: impl std::fmt::Display) -> Self {
        Self::new(format!("Network error: {cause}"), NETWORK_ERROR_STATUS, None)
    }

    /// A successful response that lacks a field the operation needs.
    pub fn missing_field(field: &str, status_code: u16) -> Self {
        Self::new(
            format!("Missing field `{field}` in response"),
            status_code,
            Some(field.to_string()),
        )
    }

    pub fn is_network(&self) -> bool {
        self.status_code == NETWORK_ERROR_STATUS
    }
}

/// Errors returned by page operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Api(#[from] ApiError),
}

impl ClientError {
    /// The underlying `ApiError`, if the failure happened after validation.
    pub fn api(&self) -> Option<&ApiError> {
        match self {
            ClientError::Api(err) => Some(err),
            ClientError::Validation(_) => None,
        }
    }
}

/// Errors raised while loading `ClientConfig` from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),

    #[error("environment variable {name} has invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}
