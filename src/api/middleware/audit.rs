//! Audit logging middleware.
//!
//! Logs every API request with method, path, account id (when
//! authenticated), response status and latency.

use std::time::Instant;

use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::accounts::Identity;

/// Log API access for the audit trail. Runs innermost on protected
/// routes so the `Identity` set by auth is visible.
pub async fn log_access(req: Request<axum::body::Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let identity = req.extensions().get::<Identity>().copied();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match identity {
        Some(who) => tracing::info!(
            target: "medibook::audit",
            %method,
            path = %path,
            account_id = %who.account_id,
            role = %who.role,
            status,
            elapsed_ms,
            "api access"
        ),
        None => tracing::info!(
            target: "medibook::audit",
            %method,
            path = %path,
            status,
            elapsed_ms,
            "api access"
        ),
    }

    response
}
