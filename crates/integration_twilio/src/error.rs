//! Twilio integration errors

use thiserror::Error;

/// Errors raised while authenticating or building webhook traffic
#[derive(Debug, Error)]
pub enum TwilioError {
    /// Signature validation is on but the request carried none
    #[error("Missing X-Twilio-Signature header")]
    MissingSignature,

    /// The signature was not valid base64
    #[error("Malformed signature: {0}")]
    MalformedSignature(String),

    /// The signature did not match the request
    #[error("Request signature mismatch")]
    SignatureMismatch,

    /// The auth token could not be used as an HMAC key
    #[error("Invalid auth token: {0}")]
    InvalidKey(String),

    /// A webhook URL could not be built from the configured base URL
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The `turn` query parameter was not a sequence number
    #[error("Invalid turn sequence: {0}")]
    InvalidTurn(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_messages() {
        assert_eq!(
            TwilioError::MissingSignature.to_string(),
            "Missing X-Twilio-Signature header"
        );
        assert_eq!(
            TwilioError::SignatureMismatch.to_string(),
            "Request signature mismatch"
        );
        assert_eq!(
            TwilioError::InvalidUrl("relative URL without a base".to_string()).to_string(),
            "Invalid URL: relative URL without a base"
        );
    }
}
