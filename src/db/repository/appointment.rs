use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_date, parse_timestamp, parse_uuid};
use crate::db::{is_unique_violation, DatabaseError};
use crate::models::*;

const APPOINTMENT_COLUMNS: &str = "ap.id, ap.doctor_id, ap.patient_id, ap.date, ap.time, ap.symptoms,
     ap.status, ap.notes, ap.created_at, ap.updated_at";

type AppointmentRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    String,
    String,
);

fn read_appointment_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
        row.get(9)?,
    ))
}

fn appointment_from_row(raw: AppointmentRow) -> Result<Appointment, DatabaseError> {
    let (id, doctor_id, patient_id, date, time, symptoms, status, notes, created_at, updated_at) = raw;
    Ok(Appointment {
        id: parse_uuid("appointments", &id)?,
        doctor_id: parse_uuid("appointments", &doctor_id)?,
        patient_id: parse_uuid("appointments", &patient_id)?,
        date: parse_date("appointments", &date)?,
        time: TimeOfDay::parse(&time).map_err(|e| DatabaseError::CorruptRow {
            table: "appointments",
            reason: e.to_string(),
        })?,
        symptoms,
        status: AppointmentStatus::from_str(&status)?,
        notes,
        created_at: parse_timestamp("appointments", &created_at)?,
        updated_at: parse_timestamp("appointments", &updated_at)?,
    })
}

/// Map a write failure on the active-slot index to `Duplicate`.
fn slot_write_error(err: rusqlite::Error) -> DatabaseError {
    if is_unique_violation(&err) {
        DatabaseError::Duplicate("appointment slot")
    } else {
        err.into()
    }
}

pub fn insert_appointment(conn: &Connection, appt: &Appointment) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (id, doctor_id, patient_id, date, time, symptoms, status, notes,
         created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            appt.id.to_string(),
            appt.doctor_id.to_string(),
            appt.patient_id.to_string(),
            appt.date.to_string(),
            appt.time.to_string(),
            appt.symptoms,
            appt.status.as_str(),
            appt.notes,
            format_timestamp(&appt.created_at),
            format_timestamp(&appt.updated_at),
        ],
    )
    .map_err(slot_write_error)?;
    Ok(())
}

pub fn get_appointment(conn: &Connection, id: &Uuid) -> Result<Option<Appointment>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments ap WHERE ap.id = ?1"),
            params![id.to_string()],
            read_appointment_row,
        )
        .optional()?;
    raw.map(appointment_from_row).transpose()
}

/// Id of the active appointment occupying (doctor, date, time), if any.
/// `exclude` skips one appointment, used when that appointment is being moved.
pub fn find_active_appointment_at(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    time: TimeOfDay,
    exclude: Option<&Uuid>,
) -> Result<Option<Uuid>, DatabaseError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT id FROM appointments
             WHERE doctor_id = ?1 AND date = ?2 AND time = ?3
               AND status IN ('pending', 'confirmed')
               AND (?4 IS NULL OR id <> ?4)
             LIMIT 1",
            params![
                doctor_id.to_string(),
                date.to_string(),
                time.to_string(),
                exclude.map(|id| id.to_string()),
            ],
            |row| row.get(0),
        )
        .optional()?;
    raw.map(|id| parse_uuid("appointments", &id)).transpose()
}

/// Times held by active appointments for a doctor on one calendar day, ascending.
pub fn active_times_on(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<TimeOfDay>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT time FROM appointments
         WHERE doctor_id = ?1 AND date = ?2 AND status IN ('pending', 'confirmed')
         ORDER BY time",
    )?;
    let rows = stmt.query_map(params![doctor_id.to_string(), date.to_string()], |row| {
        row.get::<_, String>(0)
    })?;

    let mut times = Vec::new();
    for row in rows {
        let raw = row?;
        times.push(TimeOfDay::parse(&raw).map_err(|e| DatabaseError::CorruptRow {
            table: "appointments",
            reason: e.to_string(),
        })?);
    }
    Ok(times)
}

/// Compare-and-set status change. Returns false when the row no longer
/// holds `expected`, leaving it untouched.
pub fn update_status_if(
    conn: &Connection,
    id: &Uuid,
    expected: AppointmentStatus,
    new_status: AppointmentStatus,
    updated_at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?3, updated_at = ?4 WHERE id = ?1 AND status = ?2",
        params![
            id.to_string(),
            expected.as_str(),
            new_status.as_str(),
            format_timestamp(updated_at),
        ],
    )?;
    Ok(changed > 0)
}

/// Move a pending appointment and/or replace its symptoms. Returns false
/// if the appointment is no longer pending.
pub fn update_schedule_if_pending(
    conn: &Connection,
    id: &Uuid,
    date: NaiveDate,
    time: TimeOfDay,
    symptoms: &str,
    updated_at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn
        .execute(
            "UPDATE appointments SET date = ?2, time = ?3, symptoms = ?4, updated_at = ?5
             WHERE id = ?1 AND status = 'pending'",
            params![
                id.to_string(),
                date.to_string(),
                time.to_string(),
                symptoms,
                format_timestamp(updated_at),
            ],
        )
        .map_err(slot_write_error)?;
    Ok(changed > 0)
}

pub fn update_notes(
    conn: &Connection,
    id: &Uuid,
    notes: Option<&str>,
    updated_at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET notes = ?2, updated_at = ?3 WHERE id = ?1",
        params![id.to_string(), notes, format_timestamp(updated_at)],
    )?;
    Ok(changed > 0)
}

pub fn count_active_for_doctor(conn: &Connection, doctor_id: &Uuid) -> Result<i64, DatabaseError> {
    let count = conn.query_row(
        "SELECT COUNT(*) FROM appointments
         WHERE doctor_id = ?1 AND status IN ('pending', 'confirmed')",
        params![doctor_id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Which party a listing is scoped to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentParty {
    Patient,
    Doctor,
}

/// Appointments for one party, newest date first, then latest time first.
pub fn list_appointments_for(
    conn: &Connection,
    party: AppointmentParty,
    account_id: &Uuid,
) -> Result<Vec<AppointmentView>, DatabaseError> {
    let filter = match party {
        AppointmentParty::Patient => "ap.patient_id",
        AppointmentParty::Doctor => "ap.doctor_id",
    };
    let mut stmt = conn.prepare(&format!(
        "SELECT {APPOINTMENT_COLUMNS}, d.name, d.specialization, p.name, p.email
         FROM appointments ap
         JOIN accounts d ON d.id = ap.doctor_id
         JOIN accounts p ON p.id = ap.patient_id
         WHERE {filter} = ?1
         ORDER BY ap.date DESC, ap.time DESC, ap.created_at DESC"
    ))?;

    let rows = stmt.query_map(params![account_id.to_string()], |row| {
        Ok((
            read_appointment_row(row)?,
            row.get::<_, String>(10)?,
            row.get::<_, Option<String>>(11)?,
            row.get::<_, String>(12)?,
            row.get::<_, String>(13)?,
        ))
    })?;

    let mut views = Vec::new();
    for row in rows {
        let (raw, doctor_name, doctor_specialization, patient_name, patient_email) = row?;
        views.push(AppointmentView {
            appointment: appointment_from_row(raw)?,
            doctor_name,
            doctor_specialization,
            patient_name,
            patient_email,
        });
    }
    Ok(views)
}
