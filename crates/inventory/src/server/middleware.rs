//! Axum middleware layers applied to the router.
//!
//! Includes bearer-token authorisation, permissive CORS, and the request timeout.

use std::time::Duration;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use common::ServiceError;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use super::{handlers::error_response, state::AppState};

/// Default per-request timeout applied to all routes.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Reject requests whose `Authorization: Bearer` token does not match the configured one.
///
/// A no-op when no token is configured.
pub async fn require_bearer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    if let Some(expected) = state.auth_token.as_deref() {
        let presented = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token);

        let authorised = presented
            .is_some_and(|token| constant_time_eq(token.trim().as_bytes(), expected.as_bytes()));
        if !authorised {
            warn!(
                method = %req.method(),
                path = %req.uri().path(),
                token_present = presented.is_some(),
                "rejected unauthorised request"
            );
            return error_response(ServiceError::Unauthorized);
        }
    }
    next.run(req).await
}

/// Token from an `Authorization` value; the scheme name is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim_start().split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then_some(token)
}

/// Byte comparison whose running time depends only on the lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

/// Cross-origin policy: any origin, method and header.
pub fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
}
