//! Bearer token authentication middleware.
//!
//! Extracts `Authorization: Bearer <token>`, resolves it against the
//! sessions table and injects the caller's `Identity` into request
//! extensions for downstream handlers.

use axum::http::{HeaderValue, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use super::bearer_token;
use crate::accounts;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, BearerToken};

/// Require a valid, unexpired session token.
///
/// Accesses `ApiContext` from request extensions (injected by Extension layer).
/// On success: injects `Identity` and `BearerToken`, adds `Cache-Control: no-store`.
pub async fn require_auth(req: Request<axum::body::Body>, next: Next) -> Response {
    match require_auth_inner(req, next).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn require_auth_inner(
    mut req: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    // 1. Extract bearer token
    let token = bearer_token(&req).ok_or(ApiError::Unauthorized)?.to_string();

    // 2. Resolve the session off the async executor
    let lookup = token.clone();
    let identity = ctx
        .with_db(move |conn, now| accounts::resolve_session(conn, &lookup, now))
        .await?;

    // 3. Inject identity for downstream handlers
    req.extensions_mut().insert(identity);
    req.extensions_mut().insert(BearerToken(token));

    // 4. Process request
    let mut response = next.run(req).await;

    response
        .headers_mut()
        .insert("Cache-Control", HeaderValue::from_static("no-store"));

    Ok(response)
}
