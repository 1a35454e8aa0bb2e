//! Error types for aps-auth
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling.

use std::time::Duration;

use thiserror::Error;

/// Main error type for aps-auth operations
///
/// Covers configuration loading, the local callback listener, the token
/// exchange round-trip, and parsing of the provider's token response.
#[derive(Error, Debug)]
pub enum ApsAuthError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Callback listener errors (bind failures, invalid state transitions)
    #[error("Callback listener error: {0}")]
    Listener(String),

    /// Reading or answering the browser callback request failed
    #[error("Callback error: {0}")]
    Callback(String),

    /// No callback request arrived before the deadline
    #[error("Timed out after {timeout:?} waiting for the authorization callback")]
    CallbackTimeout {
        /// The deadline that expired
        timeout: Duration,
    },

    /// The token endpoint answered with a non-success status
    #[error("Failed to retrieve token ({status}): {body}")]
    TokenExchange {
        /// HTTP status returned by the token endpoint
        status: u16,
        /// Raw response body text
        body: String,
    },

    /// The token endpoint response was not a valid token document
    #[error("Failed to parse token response: {0}")]
    TokenParse(#[source] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// URL parsing errors
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Result type alias for aps-auth operations
///
/// Uses `anyhow::Error` so callers get context chains; the concrete
/// [`ApsAuthError`] can be recovered with `downcast_ref`.
pub type Result<T> = anyhow::Result<T>;
