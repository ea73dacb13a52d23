//! API error handling
//!
//! Errors are rendered as JSON `{error, code}`. Outside development the
//! message of internal and upstream failures is replaced by a generic one.

use std::sync::atomic::{AtomicBool, Ordering};

use application::ApplicationError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use integration_twilio::TwilioError;
use serde::Serialize;
use thiserror::Error;

/// Whether internal error details are included in responses
static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(true);

/// Configure whether internal error details should be exposed in responses.
///
/// Set to `false` in production.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::SeqCst);
}

fn should_expose_details() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::SeqCst)
}

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ApiError {
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub const fn code(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "bad_request",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::RateLimited => "rate_limited",
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::Internal(_) => "internal_error",
        }
    }

    fn public_message(&self) -> String {
        match self {
            Self::BadRequest(msg) | Self::NotFound(msg) => msg.clone(),
            // Never tell the caller which check failed
            Self::Forbidden(_) => "Access denied".to_string(),
            Self::RateLimited => "Rate limit exceeded".to_string(),
            Self::ServiceUnavailable(msg) if should_expose_details() => msg.clone(),
            Self::ServiceUnavailable(_) => "Service temporarily unavailable".to_string(),
            Self::Internal(msg) if should_expose_details() => msg.clone(),
            Self::Internal(_) => "An internal error occurred".to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.public_message(),
            code: self.code().to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(err: ApplicationError) -> Self {
        match err {
            ApplicationError::Domain(e) => Self::BadRequest(e.to_string()),
            ApplicationError::InvalidRequest(msg) => Self::BadRequest(msg),
            ApplicationError::AuthRejected => Self::Forbidden(err.to_string()),
            ApplicationError::RateLimited => Self::RateLimited,
            ApplicationError::UpstreamTimeout { .. } | ApplicationError::UpstreamError { .. } => {
                Self::ServiceUnavailable(err.to_string())
            },
            ApplicationError::ClipNotFound(_) | ApplicationError::SessionNotFound(_) => {
                Self::NotFound(err.to_string())
            },
            ApplicationError::Configuration(msg) | ApplicationError::Internal(msg) => {
                Self::Internal(msg)
            },
        }
    }
}

impl From<TwilioError> for ApiError {
    fn from(err: TwilioError) -> Self {
        match err {
            TwilioError::MissingSignature
            | TwilioError::MalformedSignature(_)
            | TwilioError::SignatureMismatch => Self::Forbidden(err.to_string()),
            TwilioError::InvalidTurn(_) => Self::BadRequest(err.to_string()),
            TwilioError::InvalidKey(_) | TwilioError::InvalidUrl(_) => {
                Self::Internal(err.to_string())
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_and_code_match() {
        let cases = [
            (ApiError::BadRequest("x".into()), StatusCode::BAD_REQUEST, "bad_request"),
            (ApiError::Forbidden("x".into()), StatusCode::FORBIDDEN, "forbidden"),
            (ApiError::NotFound("x".into()), StatusCode::NOT_FOUND, "not_found"),
            (ApiError::RateLimited, StatusCode::TOO_MANY_REQUESTS, "rate_limited"),
            (
                ApiError::ServiceUnavailable("x".into()),
                StatusCode::SERVICE_UNAVAILABLE,
                "service_unavailable",
            ),
            (
                ApiError::Internal("x".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.code(), code);
            assert_eq!(err.into_response().status(), status);
        }
    }

    #[test]
    fn forbidden_hides_reason() {
        let err = ApiError::Forbidden("signature mismatch".to_string());
        assert_eq!(err.public_message(), "Access denied");
    }

    #[test]
    fn auth_rejection_is_forbidden() {
        let err: ApiError = ApplicationError::AuthRejected.into();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn invalid_request_is_bad_request() {
        let err: ApiError = ApplicationError::InvalidRequest("missing CallSid".to_string()).into();
        let ApiError::BadRequest(msg) = err else {
            unreachable!("Expected BadRequest");
        };
        assert_eq!(msg, "missing CallSid");
    }

    #[test]
    fn domain_error_is_bad_request() {
        let err: ApiError =
            ApplicationError::Domain(domain::DomainError::InvalidCallSid("bad".to_string())).into();
        assert!(matches!(err, ApiError::BadRequest(_)));
    }

    #[test]
    fn missing_clip_and_session_are_not_found() {
        let clip: ApiError = ApplicationError::ClipNotFound("abc".to_string()).into();
        let session: ApiError = ApplicationError::SessionNotFound("CA1".to_string()).into();
        assert!(matches!(clip, ApiError::NotFound(_)));
        assert!(matches!(session, ApiError::NotFound(_)));
    }

    #[test]
    fn upstream_failures_are_unavailable() {
        let timeout: ApiError = ApplicationError::UpstreamTimeout {
            service: "response generator",
            timeout_ms: 4000,
        }
        .into();
        let failed: ApiError = ApplicationError::upstream("speech synthesizer", "boom").into();
        assert!(matches!(timeout, ApiError::ServiceUnavailable(_)));
        assert!(matches!(failed, ApiError::ServiceUnavailable(_)));
        assert!(matches!(
            ApiError::from(ApplicationError::RateLimited),
            ApiError::RateLimited
        ));
    }

    #[test]
    fn configuration_is_internal() {
        let err: ApiError = ApplicationError::Configuration("bad".to_string()).into();
        assert!(matches!(err, ApiError::Internal(_)));
    }

    #[test]
    fn signature_errors_are_forbidden() {
        assert!(matches!(
            ApiError::from(TwilioError::SignatureMismatch),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(TwilioError::MissingSignature),
            ApiError::Forbidden(_)
        ));
        assert!(matches!(
            ApiError::from(TwilioError::InvalidTurn("x".to_string())),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from(TwilioError::InvalidUrl("x".to_string())),
            ApiError::Internal(_)
        ));
    }

    #[test]
    fn error_response_serialization() {
        let resp = ErrorResponse {
            error: "Access denied".to_string(),
            code: "forbidden".to_string(),
        };
        let json = serde_json::to_value(&resp).unwrap();
        assert_eq!(json["error"], "Access denied");
        assert_eq!(json["code"], "forbidden");
    }
}
