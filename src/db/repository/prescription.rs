use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_date, parse_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Prescription;

const PRESCRIPTION_COLUMNS: &str = "id, doctor_id, patient_id, diagnosis, medicines, dosage,
     instructions, follow_up_date, issued_on, created_at";

type PrescriptionRow = (
    String,
    String,
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    String,
);

fn read_prescription_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<PrescriptionRow> {
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

fn decode_lines(column: &str, raw: &str) -> Result<Vec<String>, DatabaseError> {
    serde_json::from_str(raw).map_err(|e| DatabaseError::CorruptRow {
        table: "prescriptions",
        reason: format!("{column}: {e}"),
    })
}

fn prescription_from_row(raw: PrescriptionRow) -> Result<Prescription, DatabaseError> {
    let (id, doctor_id, patient_id, diagnosis, medicines, dosage, instructions, follow_up, issued_on, created_at) =
        raw;
    Ok(Prescription {
        id: parse_uuid("prescriptions", &id)?,
        doctor_id: parse_uuid("prescriptions", &doctor_id)?,
        patient_id: parse_uuid("prescriptions", &patient_id)?,
        diagnosis,
        medicines: decode_lines("medicines", &medicines)?,
        dosage: decode_lines("dosage", &dosage)?,
        instructions,
        follow_up_date: follow_up
            .map(|d| parse_date("prescriptions", &d))
            .transpose()?,
        issued_on: parse_date("prescriptions", &issued_on)?,
        created_at: parse_timestamp("prescriptions", &created_at)?,
    })
}

pub fn insert_prescription(conn: &Connection, rx: &Prescription) -> Result<(), DatabaseError> {
    let medicines = serde_json::to_string(&rx.medicines)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;
    let dosage = serde_json::to_string(&rx.dosage)
        .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?;

    conn.execute(
        "INSERT INTO prescriptions (id, doctor_id, patient_id, diagnosis, medicines, dosage,
         instructions, follow_up_date, issued_on, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            rx.id.to_string(),
            rx.doctor_id.to_string(),
            rx.patient_id.to_string(),
            rx.diagnosis,
            medicines,
            dosage,
            rx.instructions,
            rx.follow_up_date.map(|d: NaiveDate| d.to_string()),
            rx.issued_on.to_string(),
            format_timestamp(&rx.created_at),
        ],
    )?;
    Ok(())
}

pub fn get_prescription(conn: &Connection, id: &Uuid) -> Result<Option<Prescription>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions WHERE id = ?1"),
            params![id.to_string()],
            read_prescription_row,
        )
        .optional()?;
    raw.map(prescription_from_row).transpose()
}

/// A patient's prescriptions, most recently issued first.
pub fn list_prescriptions_for_patient(
    conn: &Connection,
    patient_id: &Uuid,
) -> Result<Vec<Prescription>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescriptions
         WHERE patient_id = ?1
         ORDER BY issued_on DESC, created_at DESC"
    ))?;
    let rows = stmt.query_map(params![patient_id.to_string()], read_prescription_row)?;

    let mut prescriptions = Vec::new();
    for row in rows {
        prescriptions.push(prescription_from_row(row?)?);
    }
    Ok(prescriptions)
}
