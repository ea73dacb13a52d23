//! Domain-level errors

use thiserror::Error;

use crate::entities::TurnState;

/// Errors that can occur in the domain layer
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed provider call identifier
    #[error("Invalid call identifier: {0}")]
    InvalidCallSid(String),

    /// Malformed clip identifier
    #[error("Invalid clip identifier: {0}")]
    InvalidClipId(String),

    /// The turn state machine does not allow this move
    #[error("Invalid turn transition: {from} -> {to}")]
    InvalidTransition { from: TurnState, to: TurnState },

    /// A turn was completed after the session reached its limit
    #[error("Turn limit of {max} reached")]
    TurnLimitReached { max: u32 },

    /// Entity not found
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    /// Validation failed
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

impl DomainError {
    /// Create a not found error
    pub fn not_found(entity_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_creates_correct_error() {
        let err = DomainError::not_found("CallSession", "CA123");
        match err {
            DomainError::NotFound { entity_type, id } => {
                assert_eq!(entity_type, "CallSession");
                assert_eq!(id, "CA123");
            },
            _ => unreachable!("Expected NotFound error"),
        }
    }

    #[test]
    fn not_found_error_message_is_correct() {
        let err = DomainError::not_found("Clip", "abc");
        assert_eq!(err.to_string(), "Clip not found: abc");
    }

    #[test]
    fn invalid_call_sid_error_message() {
        let err = DomainError::InvalidCallSid("empty".to_string());
        assert_eq!(err.to_string(), "Invalid call identifier: empty");
    }

    #[test]
    fn invalid_transition_error_message() {
        let err = DomainError::InvalidTransition {
            from: TurnState::Terminated,
            to: TurnState::Generating,
        };
        assert_eq!(
            err.to_string(),
            "Invalid turn transition: terminated -> generating"
        );
    }

    #[test]
    fn turn_limit_error_message() {
        let err = DomainError::TurnLimitReached { max: 3 };
        assert_eq!(err.to_string(), "Turn limit of 3 reached");
    }

    #[test]
    fn validation_error_message() {
        let err = DomainError::ValidationError("field is required".to_string());
        assert_eq!(err.to_string(), "Validation failed: field is required");
    }
}
