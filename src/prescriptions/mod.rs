//! Prescriptions: creation from free-text lines and delivery messages.

use std::fmt::Write as _;

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;
use thiserror::Error;
use uuid::Uuid;

use crate::accounts::Identity;
use crate::db::{self, DatabaseError};
use crate::models::{Account, Prescription, Role};
use crate::notify::Message;
use crate::validation::{self, Checks, FieldError};

#[derive(Debug, Error)]
pub enum PrescriptionError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Authorization(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<Vec<FieldError>> for PrescriptionError {
    fn from(errors: Vec<FieldError>) -> Self {
        PrescriptionError::Validation(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PrescriptionRequest {
    #[serde(alias = "patientId")]
    pub patient_id: Option<String>,
    pub diagnosis: Option<String>,
    /// One medicine per line.
    pub medicines: Option<String>,
    /// One dosage per line, matched to `medicines` by position.
    pub dosage: Option<String>,
    pub instructions: Option<String>,
    #[serde(alias = "followUpDate")]
    pub follow_up_date: Option<String>,
}

/// Split newline-separated text into trimmed, non-empty lines.
pub fn split_lines(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

fn require_doctor(actor: &Identity) -> Result<(), PrescriptionError> {
    if actor.role != Role::Doctor {
        return Err(PrescriptionError::Authorization(
            "Only doctors can manage prescriptions",
        ));
    }
    Ok(())
}

/// Issue a prescription from the acting doctor to an existing patient.
pub fn create_prescription(
    conn: &Connection,
    actor: &Identity,
    req: &PrescriptionRequest,
    now: NaiveDateTime,
) -> Result<Prescription, PrescriptionError> {
    require_doctor(actor)?;

    let mut checks = Checks::new();
    let patient_id = checks.check(validation::uuid("patient_id", req.patient_id.as_deref()));
    let diagnosis = checks.check(validation::required_text("diagnosis", req.diagnosis.as_deref()));
    let medicines = split_lines(req.medicines.as_deref().unwrap_or_default());
    if medicines.is_empty() {
        checks.push(FieldError::new("medicines", "At least one medicine is required"));
    }
    let dosage = split_lines(req.dosage.as_deref().unwrap_or_default());
    let follow_up_date = match validation::optional_text(req.follow_up_date.as_deref()) {
        Some(raw) => checks.check(validation::calendar_date("follow_up_date", Some(&raw))).map(Some),
        None => Some(None),
    };
    checks.finish()?;

    let (Some(patient_id), Some(diagnosis), Some(follow_up_date)) = (patient_id, diagnosis, follow_up_date)
    else {
        return Err(PrescriptionError::Validation(Vec::new()));
    };

    match db::get_account(conn, &patient_id)? {
        Some(account) if account.role() == Role::Patient => {}
        _ => return Err(PrescriptionError::NotFound("Patient")),
    }

    let rx = Prescription {
        id: Uuid::new_v4(),
        doctor_id: actor.account_id,
        patient_id,
        diagnosis,
        medicines,
        dosage,
        instructions: validation::optional_text(req.instructions.as_deref()),
        follow_up_date,
        issued_on: now.date(),
        created_at: now,
    };
    db::insert_prescription(conn, &rx)?;

    tracing::info!(prescription_id = %rx.id, %patient_id, lines = rx.medicines.len(), "prescription issued");
    Ok(rx)
}

/// Plain-text delivery message for a prescription.
pub fn compose_message(rx: &Prescription, patient: &Account, doctor: &Account) -> Message {
    let specialization = doctor
        .doctor_profile()
        .map(|p| p.specialization.as_str())
        .unwrap_or("General Physician");

    let mut body = String::new();
    let _ = writeln!(body, "Dear {},", patient.name);
    let _ = writeln!(body);
    let _ = writeln!(
        body,
        "Here is your prescription from Dr. {} ({specialization}), issued on {}.",
        doctor.name, rx.issued_on
    );
    let _ = writeln!(body);
    let _ = writeln!(body, "Diagnosis: {}", rx.diagnosis);
    let _ = writeln!(body, "Medicines:");
    for (medicine, dose) in rx.medicine_lines() {
        let _ = writeln!(body, "  - {medicine} - {dose}");
    }
    let _ = writeln!(body, "Instructions: {}", rx.instructions.as_deref().unwrap_or("N/A"));
    match rx.follow_up_date {
        Some(date) => {
            let _ = writeln!(body, "Follow-up date: {date}");
        }
        None => {
            let _ = writeln!(body, "Follow-up date: Not specified");
        }
    }
    let _ = writeln!(body);
    let _ = writeln!(body, "Dr. {}", doctor.name);

    Message {
        to: patient.email.clone(),
        subject: format!("Medical Prescription from Dr. {}", doctor.name),
        body,
    }
}

/// Build the delivery message for a prescription the actor issued.
/// The caller hands the result to a `Notifier`.
pub fn prepare_delivery(
    conn: &Connection,
    actor: &Identity,
    prescription_id: &Uuid,
) -> Result<Message, PrescriptionError> {
    require_doctor(actor)?;
    let rx = db::get_prescription(conn, prescription_id)?.ok_or(PrescriptionError::NotFound("Prescription"))?;
    if rx.doctor_id != actor.account_id {
        return Err(PrescriptionError::Authorization(
            "Only the prescribing doctor can send this prescription",
        ));
    }
    let patient = db::get_account(conn, &rx.patient_id)?.ok_or(PrescriptionError::NotFound("Patient"))?;
    let doctor = db::get_account(conn, &rx.doctor_id)?.ok_or(PrescriptionError::NotFound("Doctor"))?;
    Ok(compose_message(&rx, &patient, &doctor))
}

pub fn list_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<Prescription>, PrescriptionError> {
    Ok(db::list_prescriptions_for_patient(conn, patient_id)?)
}
