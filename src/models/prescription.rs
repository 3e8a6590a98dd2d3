use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Prescription {
    pub id: Uuid,
    pub doctor_id: Uuid,
    pub patient_id: Uuid,
    pub diagnosis: String,
    /// One entry per medicine line, in prescribed order.
    pub medicines: Vec<String>,
    /// Dosage lines matched to `medicines` by position.
    pub dosage: Vec<String>,
    pub instructions: Option<String>,
    pub follow_up_date: Option<NaiveDate>,
    pub issued_on: NaiveDate,
    pub created_at: NaiveDateTime,
}

impl Prescription {
    /// Pair each medicine with its dosage line; missing dosages read "As directed".
    pub fn medicine_lines(&self) -> Vec<(String, String)> {
        self.medicines
            .iter()
            .enumerate()
            .map(|(i, medicine)| {
                let dose = self
                    .dosage
                    .get(i)
                    .cloned()
                    .unwrap_or_else(|| "As directed".to_string());
                (medicine.clone(), dose)
            })
            .collect()
    }
}
