use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::warn;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-api-key";

/// Compare keys in time independent of where they first differ
fn key_matches(provided: &str, expected: &str) -> bool {
    provided.as_bytes().ct_eq(expected.as_bytes()).into()
}

/// Reject requests whose `x-api-key` header does not match `expected`.
pub async fn require_api_key(
    State(expected): State<Arc<str>>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let provided = req
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if !key_matches(provided, &expected) {
        warn!(path = %req.uri().path(), "Rejected request with invalid API key");
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}
