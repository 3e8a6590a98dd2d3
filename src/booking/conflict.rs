//! Slot-conflict checker.
//!
//! A slot is held only by `pending` or `confirmed` appointments. Dates
//! compare by calendar day and times by exact `HH:MM`, both as stored.
//! The partial unique index on `appointments` is the final arbiter; this
//! check lets callers reject early with a clear error.

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use super::error::BookingError;
use crate::db::{self, DatabaseError};
use crate::models::TimeOfDay;

/// Whether an active appointment other than `exclude` occupies the slot.
pub fn is_slot_taken(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    time: TimeOfDay,
    exclude: Option<&Uuid>,
) -> Result<bool, DatabaseError> {
    Ok(db::find_active_appointment_at(conn, doctor_id, date, time, exclude)?.is_some())
}

/// `Conflict` when the slot is taken.
pub fn ensure_slot_free(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
    time: TimeOfDay,
    exclude: Option<&Uuid>,
) -> Result<(), BookingError> {
    if is_slot_taken(conn, doctor_id, date, time, exclude)? {
        tracing::debug!(%doctor_id, %date, %time, "slot already taken");
        return Err(BookingError::Conflict);
    }
    Ok(())
}
