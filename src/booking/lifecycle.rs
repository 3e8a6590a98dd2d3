//! Appointment status state machine and who may drive it.
//!
//! ```text
//! pending ──► confirmed ──► completed
//!    │            │
//!    └────────────┴──► cancelled
//! ```
//!
//! `cancelled` and `completed` are terminal.

use uuid::Uuid;

use super::error::BookingError;
use crate::models::{Appointment, AppointmentStatus};

use AppointmentStatus::{Cancelled, Completed, Confirmed, Pending};

/// Targets reachable in one step from `from`.
pub fn allowed_transitions(from: AppointmentStatus) -> &'static [AppointmentStatus] {
    match from {
        Pending => &[Confirmed, Cancelled],
        Confirmed => &[Completed, Cancelled],
        Cancelled | Completed => &[],
    }
}

pub fn can_transition(from: AppointmentStatus, to: AppointmentStatus) -> bool {
    allowed_transitions(from).contains(&to)
}

pub fn validate_transition(from: AppointmentStatus, to: AppointmentStatus) -> Result<(), BookingError> {
    if can_transition(from, to) {
        Ok(())
    } else {
        Err(BookingError::InvalidTransition { from, to })
    }
}

/// The referenced doctor may request any status; the referenced patient may
/// only cancel. Anyone else is refused. Reachability is checked separately.
pub fn authorize_transition(
    appt: &Appointment,
    actor_id: &Uuid,
    to: AppointmentStatus,
) -> Result<(), BookingError> {
    if &appt.doctor_id == actor_id {
        return Ok(());
    }
    if &appt.patient_id == actor_id {
        if to == Cancelled {
            return Ok(());
        }
        return Err(BookingError::Authorization(
            "Patients can only cancel their appointments",
        ));
    }
    Err(BookingError::Authorization(
        "Not authorized to update this appointment",
    ))
}
