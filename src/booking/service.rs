//! Booking service: validated, authorized appointment mutations.
//!
//! Functions take a borrowed connection and the acting account id. The
//! caller resolves identity and role; everything about *which* appointment
//! the actor may touch is decided here.

use chrono::NaiveDateTime;
use rusqlite::Connection;
use serde::Deserialize;
use uuid::Uuid;

use super::conflict::ensure_slot_free;
use super::error::BookingError;
use super::lifecycle::{authorize_transition, validate_transition};
use crate::db::{self, AppointmentParty};
use crate::models::{Appointment, AppointmentStatus, AppointmentView};
use crate::validation::{self, Checks};

/// Raw booking input as submitted by a client.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookingRequest {
    #[serde(alias = "doctorId")]
    pub doctor_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub symptoms: Option<String>,
}

/// Partial edit of a pending appointment. Absent fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentUpdate {
    pub date: Option<String>,
    pub time: Option<String>,
    pub symptoms: Option<String>,
}

// ═══════════════════════════════════════════════════════════
// Creation
// ═══════════════════════════════════════════════════════════

/// Book a new `pending` appointment for `patient_id`.
///
/// Order: validate input, resolve the doctor, check the slot, persist.
/// A concurrent booking that slips past the check is caught by the store's
/// active-slot index and reported as `Conflict` all the same.
pub fn create_appointment(
    conn: &Connection,
    patient_id: &Uuid,
    req: &BookingRequest,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    // 1. Validate
    let mut checks = Checks::new();
    let doctor_id = checks.check(validation::uuid("doctor_id", req.doctor_id.as_deref()));
    let date = checks.check(
        validation::calendar_date("date", req.date.as_deref())
            .and_then(|d| validation::not_in_past("date", d, now.date())),
    );
    let time = checks.check(validation::time_of_day("time", req.time.as_deref()));
    let symptoms = checks.check(validation::required_text("symptoms", req.symptoms.as_deref()));
    checks.finish()?;

    let (Some(doctor_id), Some(date), Some(time), Some(symptoms)) = (doctor_id, date, time, symptoms)
    else {
        return Err(BookingError::Validation(Vec::new()));
    };

    // 2. Resolve doctor
    match db::get_account(conn, &doctor_id)? {
        Some(account) if account.is_doctor() => {}
        _ => return Err(BookingError::NotFound("Doctor")),
    }

    // 3. Slot check
    ensure_slot_free(conn, &doctor_id, date, time, None)?;

    // 4. Persist
    let appt = Appointment {
        id: Uuid::new_v4(),
        doctor_id,
        patient_id: *patient_id,
        date,
        time,
        symptoms,
        status: AppointmentStatus::Pending,
        notes: None,
        created_at: now,
        updated_at: now,
    };
    db::insert_appointment(conn, &appt)?;

    tracing::info!(
        appointment_id = %appt.id,
        %doctor_id,
        date = %appt.date,
        time = %appt.time,
        "appointment booked"
    );
    Ok(appt)
}

// ═══════════════════════════════════════════════════════════
// Reads
// ═══════════════════════════════════════════════════════════

fn load(conn: &Connection, id: &Uuid) -> Result<Appointment, BookingError> {
    db::get_appointment(conn, id)?.ok_or(BookingError::NotFound("Appointment"))
}

/// Fetch an appointment the actor is a party to.
pub fn get_appointment_for(
    conn: &Connection,
    id: &Uuid,
    actor_id: &Uuid,
) -> Result<Appointment, BookingError> {
    let appt = load(conn, id)?;
    if !appt.involves(actor_id) {
        return Err(BookingError::Authorization(
            "Not authorized to access this appointment",
        ));
    }
    Ok(appt)
}

pub fn list_for_patient(conn: &Connection, patient_id: &Uuid) -> Result<Vec<AppointmentView>, BookingError> {
    Ok(db::list_appointments_for(conn, AppointmentParty::Patient, patient_id)?)
}

pub fn list_for_doctor(conn: &Connection, doctor_id: &Uuid) -> Result<Vec<AppointmentView>, BookingError> {
    Ok(db::list_appointments_for(conn, AppointmentParty::Doctor, doctor_id)?)
}

// ═══════════════════════════════════════════════════════════
// Edits
// ═══════════════════════════════════════════════════════════

/// Patient-side edit of date, time or symptoms while `pending`.
/// A new date/time is conflict-checked with the appointment itself excluded.
pub fn update_appointment(
    conn: &Connection,
    id: &Uuid,
    actor_id: &Uuid,
    update: &AppointmentUpdate,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    let appt = load(conn, id)?;
    if appt.patient_id != *actor_id {
        return Err(BookingError::Authorization(
            "Only the patient who booked this appointment can change it",
        ));
    }
    if appt.status != AppointmentStatus::Pending {
        return Err(BookingError::NotEditable(appt.status));
    }

    let mut checks = Checks::new();
    let date = match update.date.as_deref() {
        Some(raw) => checks.check(
            validation::calendar_date("date", Some(raw))
                .and_then(|d| validation::not_in_past("date", d, now.date())),
        ),
        None => Some(appt.date),
    };
    let time = match update.time.as_deref() {
        Some(raw) => checks.check(validation::time_of_day("time", Some(raw))),
        None => Some(appt.time),
    };
    let symptoms = match update.symptoms.as_deref() {
        Some(raw) => checks.check(validation::required_text("symptoms", Some(raw))),
        None => Some(appt.symptoms.clone()),
    };
    checks.finish()?;

    let (Some(date), Some(time), Some(symptoms)) = (date, time, symptoms) else {
        return Err(BookingError::Validation(Vec::new()));
    };

    if date != appt.date || time != appt.time {
        ensure_slot_free(conn, &appt.doctor_id, date, time, Some(&appt.id))?;
    }

    if !db::update_schedule_if_pending(conn, &appt.id, date, time, &symptoms, &now)? {
        // Status moved on between the read and the write.
        let current = load(conn, id)?;
        return Err(BookingError::NotEditable(current.status));
    }

    tracing::info!(appointment_id = %appt.id, %date, %time, "appointment updated");
    Ok(Appointment {
        date,
        time,
        symptoms,
        updated_at: now,
        ..appt
    })
}

/// Doctor-authored notes. Blank notes clear the field.
pub fn set_notes(
    conn: &Connection,
    id: &Uuid,
    actor_id: &Uuid,
    notes: Option<&str>,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    let appt = load(conn, id)?;
    if appt.doctor_id != *actor_id {
        return Err(BookingError::Authorization(
            "Only the appointment's doctor can write notes",
        ));
    }
    let notes = validation::optional_text(notes);
    if !db::update_notes(conn, &appt.id, notes.as_deref(), &now)? {
        return Err(BookingError::NotFound("Appointment"));
    }
    Ok(Appointment {
        notes,
        updated_at: now,
        ..appt
    })
}

// ═══════════════════════════════════════════════════════════
// Status changes
// ═══════════════════════════════════════════════════════════

/// Apply a status change on behalf of `actor_id`.
///
/// Authorization is checked before reachability, so a patient asking for
/// `confirmed` learns they may not, whatever the current state. The write
/// is compare-and-set on the status that was read; losing a race reports
/// the transition from the status that won.
pub fn set_status(
    conn: &Connection,
    id: &Uuid,
    actor_id: &Uuid,
    new_status: AppointmentStatus,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    let appt = load(conn, id)?;
    authorize_transition(&appt, actor_id, new_status)?;
    validate_transition(appt.status, new_status)?;

    if !db::update_status_if(conn, &appt.id, appt.status, new_status, &now)? {
        let current = load(conn, id)?;
        tracing::warn!(
            appointment_id = %appt.id,
            expected = %appt.status,
            found = %current.status,
            "status changed concurrently"
        );
        return Err(BookingError::InvalidTransition {
            from: current.status,
            to: new_status,
        });
    }

    tracing::info!(
        appointment_id = %appt.id,
        from = %appt.status,
        to = %new_status,
        %actor_id,
        "appointment status changed"
    );
    Ok(Appointment {
        status: new_status,
        updated_at: now,
        ..appt
    })
}

/// Soft-cancel: the record stays, its slot is released.
pub fn cancel_appointment(
    conn: &Connection,
    id: &Uuid,
    actor_id: &Uuid,
    now: NaiveDateTime,
) -> Result<Appointment, BookingError> {
    set_status(conn, id, actor_id, AppointmentStatus::Cancelled, now)
}
