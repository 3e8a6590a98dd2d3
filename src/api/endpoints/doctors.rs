//! Doctor directory endpoints.
//!
//! - `GET /api/doctors`: public, sorted by name
//! - `GET /api/doctors/:id`: public
//! - `DELETE /api/admin/doctors/:id`: admin soft removal

use axum::extract::{Path, State};
use axum::{Extension, Json};

use super::parse_id;
use crate::accounts::{self, Identity};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::models::Account;

pub async fn list(State(ctx): State<ApiContext>) -> Result<Json<ApiResponse<Vec<Account>>>, ApiError> {
    let doctors = ctx.with_db(|conn, _| accounts::list_doctors(conn)).await?;
    Ok(Json(ApiResponse::list(doctors)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<String>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let doctor_id = parse_id(&doctor_id, "doctor")?;
    let doctor = ctx
        .with_db(move |conn, _| accounts::get_doctor(conn, &doctor_id))
        .await?;
    Ok(Json(ApiResponse::ok(doctor)))
}

pub async fn remove(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(doctor_id): Path<String>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let doctor_id = parse_id(&doctor_id, "doctor")?;
    let removed = ctx
        .with_db(move |conn, now| accounts::remove_doctor(conn, &identity, &doctor_id, now))
        .await?;
    Ok(Json(ApiResponse::ok(removed).with_message("Doctor removed")))
}
