//! Inference errors

use thiserror::Error;

/// Errors that can occur during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Failed to connect to inference server
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to inference server failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API key missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Model not found or not accessible
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Response parsing failed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout during inference
    #[error("Inference timeout after {0}ms")]
    Timeout(u64),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Server error
    #[error("Server error: {0}")]
    ServerError(String),
}

impl InferenceError {
    /// Map a transport error, reporting timeouts with the configured deadline
    pub fn from_transport(err: &reqwest::Error, timeout_ms: u64) -> Self {
        if err.is_timeout() {
            Self::Timeout(timeout_ms)
        } else if err.is_connect() {
            Self::ConnectionFailed(err.to_string())
        } else {
            Self::RequestFailed(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_includes_deadline() {
        assert_eq!(
            InferenceError::Timeout(3500).to_string(),
            "Inference timeout after 3500ms"
        );
    }

    #[test]
    fn unauthorized_message() {
        let err = InferenceError::Unauthorized("invalid key".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid key");
    }

    #[test]
    fn rate_limited_message() {
        assert_eq!(InferenceError::RateLimited.to_string(), "Rate limit exceeded");
    }
}
