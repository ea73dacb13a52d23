//! Application-level errors

use domain::DomainError;
use thiserror::Error;

/// Errors that can occur in the application layer
#[derive(Debug, Error)]
pub enum ApplicationError {
    /// Domain-level error
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Webhook secret did not match
    #[error("Webhook authentication rejected")]
    AuthRejected,

    /// Malformed inbound request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// An upstream call did not finish within its deadline
    #[error("{service} timed out after {timeout_ms}ms")]
    UpstreamTimeout {
        service: &'static str,
        timeout_ms: u64,
    },

    /// An upstream call failed
    #[error("{service} failed: {message}")]
    UpstreamError {
        service: &'static str,
        message: String,
    },

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Clip unknown, expired, or served too often
    #[error("Clip not found: {0}")]
    ClipNotFound(String),

    /// No live session for this call
    #[error("Call session not found: {0}")]
    SessionNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApplicationError {
    /// Create an upstream failure for `service`
    pub fn upstream(service: &'static str, message: impl Into<String>) -> Self {
        Self::UpstreamError {
            service,
            message: message.into(),
        }
    }

    /// Check if this error is retryable
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited | Self::UpstreamTimeout { .. } | Self::UpstreamError { .. }
        )
    }
}
