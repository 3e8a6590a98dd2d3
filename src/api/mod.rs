//! HTTP API.
//!
//! Routes are nested under `/api/` behind a middleware stack:
//! Rate Limit → Auth (protected routes) → Audit → Handler.
//!
//! `api_router()` returns a `Router` that can be mounted on any axum
//! server; `start_server()` runs it on a bound address.

pub mod endpoints;
pub mod error;
pub mod middleware;
pub mod router;
pub mod server;
pub mod types;

pub use router::api_router;
pub use server::{start_server, ApiServer, ServerError, ServerSession};
pub use types::ApiContext;
