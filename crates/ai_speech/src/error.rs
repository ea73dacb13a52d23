//! Speech processing errors

use thiserror::Error;

/// Errors that can occur during speech synthesis
#[derive(Debug, Error)]
pub enum SpeechError {
    /// Failed to connect to speech service
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Request to speech service failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// API key missing or rejected
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Synthesis failed
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// Invalid response from service
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Timeout during processing
    #[error("Speech processing timeout after {0}ms")]
    Timeout(u64),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimited,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Voice not found
    #[error("Voice not found: {0}")]
    VoiceNotFound(String),

    /// Service unavailable
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl SpeechError {
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
    fn connection_failed_error_message() {
        let err = SpeechError::ConnectionFailed("refused".to_string());
        assert_eq!(err.to_string(), "Connection failed: refused");
    }

    #[test]
    fn unauthorized_error_message() {
        let err = SpeechError::Unauthorized("invalid api key".to_string());
        assert_eq!(err.to_string(), "Unauthorized: invalid api key");
    }

    #[test]
    fn synthesis_failed_error_message() {
        let err = SpeechError::SynthesisFailed("invalid text".to_string());
        assert_eq!(err.to_string(), "Synthesis failed: invalid text");
    }

    #[test]
    fn timeout_error_message() {
        let err = SpeechError::Timeout(4500);
        assert_eq!(err.to_string(), "Speech processing timeout after 4500ms");
    }

    #[test]
    fn rate_limited_error_message() {
        assert_eq!(SpeechError::RateLimited.to_string(), "Rate limit exceeded");
    }

    #[test]
    fn voice_not_found_error_message() {
        let err = SpeechError::VoiceNotFound("custom-voice".to_string());
        assert_eq!(err.to_string(), "Voice not found: custom-voice");
    }

    #[test]
    fn service_unavailable_error_message() {
        let err = SpeechError::ServiceUnavailable("maintenance".to_string());
        assert_eq!(err.to_string(), "Service unavailable: maintenance");
    }
}
