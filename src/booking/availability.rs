//! Availability calculator: the daily template minus active bookings.

use std::collections::HashSet;

use chrono::NaiveDate;
use rusqlite::Connection;
use uuid::Uuid;

use super::error::BookingError;
use super::slot::DailyTemplate;
use crate::db;
use crate::models::TimeOfDay;

/// Template slots not present in `booked`, ascending.
pub fn available_slots(template: &DailyTemplate, booked: &[TimeOfDay]) -> Vec<TimeOfDay> {
    let taken: HashSet<TimeOfDay> = booked.iter().copied().collect();
    template.slots().filter(|slot| !taken.contains(slot)).collect()
}

/// Open slots for a live doctor on `date`. `NotFound` if the id is not a doctor.
pub fn get_available_slots(
    conn: &Connection,
    doctor_id: &Uuid,
    date: NaiveDate,
) -> Result<Vec<TimeOfDay>, BookingError> {
    match db::get_account(conn, doctor_id)? {
        Some(account) if account.is_doctor() => {}
        _ => return Err(BookingError::NotFound("Doctor")),
    }
    let booked = db::active_times_on(conn, doctor_id, date)?;
    Ok(available_slots(&DailyTemplate::standard(), &booked))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::insert_appointment;
    use crate::models::{Appointment, AppointmentStatus};
    use crate::test_support::*;

    fn t(raw: &str) -> TimeOfDay {
        TimeOfDay::parse(raw).unwrap()
    }

    fn book(conn: &Connection, doctor: &Uuid, patient: &Uuid, time: &str, status: AppointmentStatus) {
        insert_appointment(
            conn,
            &Appointment {
                id: Uuid::new_v4(),
                doctor_id: *doctor,
                patient_id: *patient,
                date: date("2025-06-10"),
                time: t(time),
                symptoms: "checkup".into(),
                status,
                notes: None,
                created_at: noon("2025-06-01"),
                updated_at: noon("2025-06-01"),
            },
        )
        .unwrap();
    }

    #[test]
    fn nothing_booked_returns_full_template() {
        let slots = available_slots(&DailyTemplate::standard(), &[]);
        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn booked_times_are_removed_in_order() {
        let slots = available_slots(&DailyTemplate::standard(), &[t("09:00"), t("13:30")]);
        assert_eq!(slots.len(), 14);
        assert_eq!(slots[0], t("09:30"));
        assert!(!slots.contains(&t("13:30")));
        assert!(slots.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn off_template_bookings_are_ignored() {
        let slots = available_slots(&DailyTemplate::standard(), &[t("08:00"), t("10:15")]);
        assert_eq!(slots.len(), 16);
    }

    #[test]
    fn fully_booked_day_is_empty() {
        let template = DailyTemplate::standard();
        let all: Vec<TimeOfDay> = template.slots().collect();
        assert!(available_slots(&template, &all).is_empty());
    }

    #[test]
    fn one_active_booking_leaves_fifteen() {
        let conn = memory_db();
        let doctor = seed_doctor(&conn, "Doc");
        let patient = seed_patient(&conn, "Pat");
        book(&conn, &doctor.id, &patient.id, "09:00", AppointmentStatus::Pending);

        let slots = get_available_slots(&conn, &doctor.id, date("2025-06-10")).unwrap();
        assert_eq!(slots.len(), 15);
        assert_eq!(slots[0], t("09:30"));
    }

    #[test]
    fn availability_complements_active_bookings() {
        let conn = memory_db();
        let doctor = seed_doctor(&conn, "Doc");
        let patient = seed_patient(&conn, "Pat");
        book(&conn, &doctor.id, &patient.id, "09:00", AppointmentStatus::Confirmed);
        book(&conn, &doctor.id, &patient.id, "11:00", AppointmentStatus::Pending);
        book(&conn, &doctor.id, &patient.id, "12:00", AppointmentStatus::Cancelled);
        book(&conn, &doctor.id, &patient.id, "15:00", AppointmentStatus::Completed);

        let day = date("2025-06-10");
        let open = get_available_slots(&conn, &doctor.id, day).unwrap();
        let active = db::active_times_on(&conn, &doctor.id, day).unwrap();

        let open_set: HashSet<TimeOfDay> = open.iter().copied().collect();
        let active_set: HashSet<TimeOfDay> = active.iter().copied().collect();
        assert!(open_set.is_disjoint(&active_set));
        let union: HashSet<TimeOfDay> = open_set.union(&active_set).copied().collect();
        let template: HashSet<TimeOfDay> = DailyTemplate::standard().slots().collect();
        assert_eq!(union, template);
        assert!(open.contains(&t("12:00")));
        assert!(open.contains(&t("15:00")));
    }

    #[test]
    fn unknown_or_non_doctor_is_not_found() {
        let conn = memory_db();
        let patient = seed_patient(&conn, "Pat");
        assert!(matches!(
            get_available_slots(&conn, &patient.id, date("2025-06-10")),
            Err(BookingError::NotFound("Doctor"))
        ));
        assert!(matches!(
            get_available_slots(&conn, &Uuid::new_v4(), date("2025-06-10")),
            Err(BookingError::NotFound("Doctor"))
        ));
    }
}
