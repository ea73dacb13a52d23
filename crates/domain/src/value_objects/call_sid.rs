//! Provider call identifier

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

/// Maximum accepted length of a call identifier
pub const MAX_CALL_SID_LEN: usize = 64;

/// Identifier the telephony provider assigns to one phone call
///
/// Stable for the duration of the call. Accepted values are trimmed, non-empty,
/// at most [`MAX_CALL_SID_LEN`] characters and made of ASCII alphanumerics,
/// `-`, `_` or `.`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CallSid(String);

impl CallSid {
    /// Create a call identifier, validating its format
    pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(DomainError::InvalidCallSid(
                "call identifier must not be empty".to_string(),
            ));
        }

        if trimmed.len() > MAX_CALL_SID_LEN {
            return Err(DomainError::InvalidCallSid(format!(
                "call identifier exceeds {MAX_CALL_SID_LEN} characters"
            )));
        }

        if !trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(DomainError::InvalidCallSid(format!(
                "call identifier contains invalid characters: {trimmed:?}"
            )));
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Get the identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CallSid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for CallSid {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CallSid {
    type Error = DomainError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CallSid> for String {
    fn from(sid: CallSid) -> Self {
        sid.0
    }
}

impl AsRef<str> for CallSid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn twilio_style_sid_is_accepted() {
        let sid = CallSid::new("CA0123456789abcdef0123456789abcdef").unwrap();
        assert_eq!(sid.as_str(), "CA0123456789abcdef0123456789abcdef");
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let sid = CallSid::new("  CA123 \n").unwrap();
        assert_eq!(sid.as_str(), "CA123");
    }

    #[test]
    fn empty_sid_is_rejected() {
        assert!(CallSid::new("").is_err());
        assert!(CallSid::new("   ").is_err());
    }

    #[test]
    fn overlong_sid_is_rejected() {
        let long = "C".repeat(MAX_CALL_SID_LEN + 1);
        assert!(CallSid::new(long).is_err());
    }

    #[test]
    fn sid_with_markup_characters_is_rejected() {
        assert!(CallSid::new("CA<script>").is_err());
        assert!(CallSid::new("CA 123").is_err());
    }

    #[test]
    fn display_matches_value() {
        let sid = CallSid::new("CA123").unwrap();
        assert_eq!(sid.to_string(), "CA123");
    }

    #[test]
    fn serde_roundtrip_validates() {
        let sid = CallSid::new("CA123").unwrap();
        let json = serde_json::to_string(&sid).unwrap();
        assert_eq!(json, "\"CA123\"");

        let parsed: CallSid = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, sid);

        let invalid: Result<CallSid, _> = serde_json::from_str("\"\"");
        assert!(invalid.is_err());
    }

    #[test]
    fn try_from_str() {
        let sid: CallSid = "CA999".try_into().unwrap();
        assert_eq!(sid.as_ref(), "CA999");
    }
}
