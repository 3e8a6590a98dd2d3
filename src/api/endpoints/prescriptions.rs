//! Prescription endpoints.
//!
//! - `POST /api/prescriptions`: doctor issues a prescription
//! - `POST /api/prescriptions/:id/send`: queue delivery to the patient
//! - `GET /api/prescriptions/patient`: caller's prescriptions

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;

use super::{parse_id, require_role};
use crate::accounts::Identity;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::models::{Prescription, Role};
use crate::prescriptions::{self, PrescriptionRequest};

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<PrescriptionRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Prescription>>), ApiError> {
    let Json(req) = payload?;
    let rx = ctx
        .with_db(move |conn, now| prescriptions::create_prescription(conn, &identity, &req, now))
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(rx).with_message("Prescription created")),
    ))
}

#[derive(Debug, Serialize)]
pub struct Delivery {
    pub to: String,
}

pub async fn send(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Delivery>>, ApiError> {
    let id = parse_id(&id, "prescription")?;
    let message = ctx
        .with_db(move |conn, _| prescriptions::prepare_delivery(conn, &identity, &id))
        .await?;

    let delivery = Delivery {
        to: message.to.clone(),
    };
    ctx.state.notifier.send(message);
    Ok(Json(
        ApiResponse::ok(delivery).with_message("Prescription queued for delivery"),
    ))
}

pub async fn list_patient(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<Prescription>>>, ApiError> {
    require_role(&identity, Role::Patient, "Patient access required")?;
    let list = ctx
        .with_db(move |conn, _| prescriptions::list_for_patient(conn, &identity.account_id))
        .await?;
    Ok(Json(ApiResponse::list(list)))
}
