use thiserror::Error;

use crate::db::DatabaseError;
use crate::models::AppointmentStatus;
use crate::validation::FieldError;

/// Outcomes the booking core reports to its callers.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// The (doctor, date, time) slot is held by another active appointment.
    #[error("This time slot is already booked for the selected doctor. Please choose another time or date.")]
    Conflict,

    #[error("{0}")]
    Authorization(&'static str),

    #[error("Cannot change appointment status from {from} to {to}")]
    InvalidTransition {
        from: AppointmentStatus,
        to: AppointmentStatus,
    },

    #[error("Appointment can only be changed while pending (currently {0})")]
    NotEditable(AppointmentStatus),

    #[error("Database error: {0}")]
    Database(DatabaseError),
}

impl From<DatabaseError> for BookingError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::Duplicate("appointment slot") => BookingError::Conflict,
            other => BookingError::Database(other),
        }
    }
}

impl From<Vec<FieldError>> for BookingError {
    fn from(errors: Vec<FieldError>) -> Self {
        BookingError::Validation(errors)
    }
}
