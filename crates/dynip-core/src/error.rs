//! Error types for the dynip poller
//!
//! This module defines all error types used throughout the workspace.

use thiserror::Error;

/// Result type alias for poller operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the poller
#[derive(Error, Debug)]
pub enum Error {
    /// No HTTP client could be constructed
    #[error("Transport unavailable: {0}")]
    TransportUnavailable(String),

    /// Connection failure, timeout or non-2xx status
    #[error("Network error: {0}")]
    Network(String),

    /// Credentials rejected by the DNS provider
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// A response body that could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem errors (config file loading)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The provider understood the request but refused it
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },
}

impl Error {
    /// Create a transport error
    pub fn transport(msg: impl Into<String>) -> Self {
        Self::TransportUnavailable(msg.into())
    }

    /// Create a network error
    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the provider rejected our credentials
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// Whether this is a transport-level failure (connect, timeout, status)
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Longest response excerpt carried in an error message
pub const MAX_BODY_EXCERPT: usize = 100;

/// First line of a response body, capped at [`MAX_BODY_EXCERPT`] chars
///
/// Response bodies end up in errors and from there in logs; an HTML error
/// page must not.
pub fn body_excerpt(body: &str) -> String {
    let line = body.trim().lines().next().unwrap_or("").trim();
    match line.char_indices().nth(MAX_BODY_EXCERPT) {
        Some((cut, _)) => format!("{}...", &line[..cut]),
        None => line.to_string(),
    }
}
