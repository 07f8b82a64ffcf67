//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Variants map to HTTP status codes returned to callers:
/// - [`ServiceError::BadRequest`] → 400
/// - [`ServiceError::Unauthorized`] → 401
/// - [`ServiceError::NotFound`] → 404
/// - [`ServiceError::MethodNotAllowed`] → 405
/// - [`ServiceError::Internal`] → 500
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request was malformed: a missing parameter or field, or invalid JSON.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// The bearer token was missing or did not match.
    #[error("unauthorized")]
    Unauthorized,

    /// The targeted record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The HTTP method is not supported on this resource.
    #[error("method not allowed: {0}")]
    MethodNotAllowed(String),

    /// An unexpected internal error occurred. The message is never sent to callers.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ServiceError {
    /// Returns the HTTP status code that should be sent for this error.
    pub fn http_status(&self) -> u16 {
        match self {
            ServiceError::BadRequest(_) => 400,
            ServiceError::Unauthorized => 401,
            ServiceError::NotFound(_) => 404,
            ServiceError::MethodNotAllowed(_) => 405,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Short machine-readable error code used in [`crate::protocol::ErrorResponse`].
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::BadRequest(_) => "bad_request",
            ServiceError::Unauthorized => "unauthorized",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::MethodNotAllowed(_) => "method_not_allowed",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// Message that is safe to expose to callers.
    ///
    /// Internal errors collapse to a generic message so backend details never leak.
    pub fn public_message(&self) -> String {
        match self {
            ServiceError::BadRequest(m)
            | ServiceError::NotFound(m)
            | ServiceError::MethodNotAllowed(m) => m.clone(),
            ServiceError::Unauthorized => "missing or invalid bearer token".into(),
            ServiceError::Internal(_) => "internal server error".into(),
        }
    }
}
