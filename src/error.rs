// src/error.rs

//! Unified error handling for the restock monitor.

use std::fmt;

use thiserror::Error;

use crate::services::FetchError;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Required credentials are missing from the environment
    #[error("Missing credentials: {0}")]
    MissingCredentials(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Search kept failing with retryable errors until the budget ran out
    #[error("Search for '{keyword}' failed after {attempts} attempt(s): {cause}")]
    SearchExhausted {
        keyword: String,
        attempts: u32,
        cause: FetchError,
    },

    /// Search failed with an error that is not worth retrying
    #[error("Search for '{keyword}' rejected: {cause}")]
    SearchRejected { keyword: String, cause: FetchError },

    /// Push notification could not be delivered
    #[error("Notification error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a missing-credentials error.
    pub fn missing_credentials(names: impl fmt::Display) -> Self {
        Self::MissingCredentials(names.to_string())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a notification error.
    pub fn notify(message: impl fmt::Display) -> Self {
        Self::Notify(message.to_string())
    }
}
