//! API middleware stack.
//!
//! Execution order (outermost → innermost):
//! 1. Rate limiter: reject early, save resources
//! 2. Auth validator: bearer token → `Identity` (protected routes only)
//! 3. Audit logger: logs after auth, has the account id

pub mod audit;
pub mod auth;
pub mod rate;

use axum::http::Request;

/// Bearer token from the `Authorization` header, if present.
pub(crate) fn bearer_token<B>(req: &Request<B>) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}
