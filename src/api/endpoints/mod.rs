//! API endpoint handlers.
//!
//! Each module covers one resource. Handlers parse and authorize at the
//! edge, then run core operations through `ApiContext::with_db`.

pub mod appointments;
pub mod auth;
pub mod doctors;
pub mod health;
pub mod prescriptions;

use uuid::Uuid;

use crate::accounts::Identity;
use crate::api::error::ApiError;
use crate::models::Role;

/// Parse a path id, rejecting malformed values with 400.
pub(crate) fn parse_id(raw: &str, what: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw.trim()).map_err(|_| ApiError::BadRequest(format!("Invalid {what} ID format")))
}

/// Gate an endpoint on the caller's role.
pub(crate) fn require_role(identity: &Identity, role: Role, message: &str) -> Result<(), ApiError> {
    if identity.role != role {
        return Err(ApiError::Forbidden(message.to_string()));
    }
    Ok(())
}
