use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

use super::enums::AppointmentStatus;
use super::schedule::TimeOfDay;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Appointment {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub date: NaiveDate,
    pub time: TimeOfDay,
    pub symptoms: String,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Appointment {
    /// Whether `account_id` is the doctor or the patient on this booking.
    pub fn involves(&self, account_id: &Uuid) -> bool {
        &self.doctor_id == account_id || &self.patient_id == account_id
    }
}

/// Appointment joined with the display names of both parties, for listings.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentView {
    #[serde(flatten)]
    pub appointment: Appointment,
    pub doctor_name: String,
    pub doctor_specialization: Option<String>,
    pub patient_name: String,
    pub patient_email: String,
}
