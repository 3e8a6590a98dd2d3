//! Appointment endpoints.
//!
//! - `POST /api/appointments`: patient books a slot
//! - `GET /api/appointments/patient`: caller's bookings as patient
//! - `GET /api/appointments/doctor`: caller's bookings as doctor
//! - `GET /api/appointments/availability/:doctor_id?date=`: open `HH:MM` slots
//! - `GET|PUT|DELETE /api/appointments/:id`: view, edit, cancel
//! - `PUT /api/appointments/:id/status`: status change
//! - `PUT /api/appointments/:id/notes`: doctor's notes

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use rusqlite::Connection;
use serde::Deserialize;

use super::{parse_id, require_role};
use crate::accounts::Identity;
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse};
use crate::booking::{self, AppointmentUpdate, BookingRequest};
use crate::db;
use crate::models::{Appointment, AppointmentStatus, AppointmentView, Role, TimeOfDay};
use crate::notify::{self, Message};
use crate::validation::{self, FieldError};

pub async fn create(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    payload: Result<Json<BookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<Appointment>>), ApiError> {
    require_role(&identity, Role::Patient, "Only patients can book appointments")?;
    let Json(req) = payload?;

    let appt = ctx
        .with_db(move |conn, now| booking::create_appointment(conn, &identity.account_id, &req, now))
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(appt).with_message("Appointment booked successfully!")),
    ))
}

pub async fn list_patient(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<AppointmentView>>>, ApiError> {
    require_role(&identity, Role::Patient, "Patient access required")?;
    let views = ctx
        .with_db(move |conn, _| booking::list_for_patient(conn, &identity.account_id))
        .await?;
    Ok(Json(ApiResponse::list(views)))
}

pub async fn list_doctor(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Vec<AppointmentView>>>, ApiError> {
    require_role(&identity, Role::Doctor, "Doctor access required")?;
    let views = ctx
        .with_db(move |conn, _| booking::list_for_doctor(conn, &identity.account_id))
        .await?;
    Ok(Json(ApiResponse::list(views)))
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: Option<String>,
}

pub async fn availability(
    State(ctx): State<ApiContext>,
    Path(doctor_id): Path<String>,
    query: Result<Query<AvailabilityQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<Vec<TimeOfDay>>>, ApiError> {
    let doctor_id = parse_id(&doctor_id, "doctor")?;
    let Query(query) = query?;
    let date = validation::calendar_date("date", query.date.as_deref())
        .map_err(|e| ApiError::Validation(vec![e]))?;

    let slots = ctx
        .with_db(move |conn, _| booking::get_available_slots(conn, &doctor_id, date))
        .await?;

    Ok(Json(ApiResponse::list(slots)))
}

pub async fn detail(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let id = parse_id(&id, "appointment")?;
    let appt = ctx
        .with_db(move |conn, _| booking::get_appointment_for(conn, &id, &identity.account_id))
        .await?;
    Ok(Json(ApiResponse::ok(appt)))
}

pub async fn update(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<AppointmentUpdate>, JsonRejection>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let id = parse_id(&id, "appointment")?;
    let Json(update) = payload?;
    let appt = ctx
        .with_db(move |conn, now| booking::update_appointment(conn, &id, &identity.account_id, &update, now))
        .await?;
    Ok(Json(ApiResponse::ok(appt).with_message("Appointment updated")))
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: Option<String>,
}

pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<StatusRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let id = parse_id(&id, "appointment")?;
    let Json(body) = payload?;
    let status = body
        .status
        .as_deref()
        .and_then(|raw| raw.trim().parse::<AppointmentStatus>().ok())
        .ok_or_else(|| {
            ApiError::Validation(vec![FieldError::new(
                "status",
                "Status must be one of pending, confirmed, cancelled, completed",
            )])
        })?;

    let (appt, notice) = ctx
        .with_db(move |conn, now| {
            let appt = booking::set_status(conn, &id, &identity.account_id, status, now)?;
            let notice = status_notice(conn, &appt);
            Ok::<_, booking::BookingError>((appt, notice))
        })
        .await?;

    if let Some(message) = notice {
        ctx.state.notifier.send(message);
    }
    Ok(Json(
        ApiResponse::ok(appt).with_message(format!("Appointment {status}")),
    ))
}

pub async fn cancel(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    let id = parse_id(&id, "appointment")?;
    let notice = ctx
        .with_db(move |conn, now| {
            let appt = booking::cancel_appointment(conn, &id, &identity.account_id, now)?;
            Ok::<_, booking::BookingError>(status_notice(conn, &appt))
        })
        .await?;

    if let Some(message) = notice {
        ctx.state.notifier.send(message);
    }
    Ok(Json(
        ApiResponse::ok(serde_json::json!({})).with_message("Appointment cancelled"),
    ))
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    pub notes: Option<String>,
}

pub async fn update_notes(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
    payload: Result<Json<NotesRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Appointment>>, ApiError> {
    let id = parse_id(&id, "appointment")?;
    let Json(body) = payload?;
    let appt = ctx
        .with_db(move |conn, now| {
            booking::set_notes(conn, &id, &identity.account_id, body.notes.as_deref(), now)
        })
        .await?;
    Ok(Json(ApiResponse::ok(appt).with_message("Notes saved")))
}

/// Patient-facing message for a committed status change. Lookup failures
/// are logged and skip the notice; the change itself already stands.
fn status_notice(conn: &Connection, appt: &Appointment) -> Option<Message> {
    let patient = match db::get_account(conn, &appt.patient_id) {
        Ok(Some(patient)) => patient,
        Ok(None) => return None,
        Err(e) => {
            tracing::warn!(appointment_id = %appt.id, error = %e, "patient lookup failed, notice skipped");
            return None;
        }
    };
    let doctor_name = match db::get_account(conn, &appt.doctor_id) {
        Ok(Some(doctor)) => doctor.name,
        Ok(None) => "Unknown".to_string(),
        Err(e) => {
            tracing::warn!(appointment_id = %appt.id, error = %e, "doctor lookup failed, notice skipped");
            return None;
        }
    };
    Some(notify::status_change_message(
        &patient.email,
        &patient.name,
        &doctor_name,
        appt,
    ))
}
