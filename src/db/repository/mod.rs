//! Repository layer: entity-scoped database operations.
//!
//! Free functions over a borrowed `Connection`, one sub-module per table.
//! All public functions are re-exported here.

mod account;
mod appointment;
mod prescription;
mod session;

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use super::DatabaseError;

pub use account::*;
pub use appointment::*;
pub use prescription::*;
pub use session::*;

/// Storage format for every timestamp column.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub(crate) fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(table: &'static str, raw: &str) -> Result<NaiveDateTime, DatabaseError> {
    NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).map_err(|e| DatabaseError::CorruptRow {
        table,
        reason: format!("timestamp `{raw}`: {e}"),
    })
}

pub(crate) fn parse_date(table: &'static str, raw: &str) -> Result<NaiveDate, DatabaseError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| DatabaseError::CorruptRow {
        table,
        reason: format!("date `{raw}`: {e}"),
    })
}

pub(crate) fn parse_uuid(table: &'static str, raw: &str) -> Result<Uuid, DatabaseError> {
    Uuid::parse_str(raw).map_err(|e| DatabaseError::CorruptRow {
        table,
        reason: format!("id `{raw}`: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::*;
    use rusqlite::Connection;

    fn test_db() -> Connection {
        open_memory_database().unwrap()
    }

    fn ts(raw: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT).unwrap()
    }

    fn make_account(conn: &Connection, name: &str, kind: AccountKind) -> Account {
        let account = Account {
            id: Uuid::new_v4(),
            name: name.into(),
            email: format!("{}@medibook.test", name.to_lowercase().replace(' ', ".")),
            kind,
            created_at: ts("2025-01-01 09:00:00"),
        };
        insert_account(conn, &account, "hash").unwrap();
        account
    }

    fn make_doctor(conn: &Connection, name: &str, registration_id: &str) -> Account {
        make_account(
            conn,
            name,
            AccountKind::Doctor(DoctorProfile {
                specialization: "General Practice".into(),
                experience_years: 7,
                contact_phone: "555-0101".into(),
                bio: "Family medicine".into(),
                registration_id: registration_id.into(),
            }),
        )
    }

    fn make_appointment(
        doctor: &Account,
        patient: &Account,
        date: &str,
        time: &str,
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            patient_id: patient.id,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: TimeOfDay::parse(time).unwrap(),
            symptoms: "headache".into(),
            status,
            notes: None,
            created_at: ts("2025-06-01 08:00:00"),
            updated_at: ts("2025-06-01 08:00:00"),
        }
    }

    #[test]
    fn account_insert_and_retrieve_doctor() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Ada Lovelace", "MD-AAAAAA");
        let loaded = get_account(&conn, &doctor.id).unwrap().unwrap();
        assert_eq!(loaded, doctor);
        assert_eq!(loaded.doctor_profile().unwrap().experience_years, 7);
    }

    #[test]
    fn duplicate_email_is_reported() {
        let conn = test_db();
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        let mut clone = patient.clone();
        clone.id = Uuid::new_v4();
        let err = insert_account(&conn, &clone, "hash").unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate("email")));
    }

    #[test]
    fn duplicate_registration_id_is_reported() {
        let conn = test_db();
        make_doctor(&conn, "First Doc", "MD-SAME01");
        let second = Account {
            id: Uuid::new_v4(),
            name: "Second Doc".into(),
            email: "second@medibook.test".into(),
            kind: AccountKind::Doctor(DoctorProfile {
                specialization: "ENT".into(),
                experience_years: 1,
                contact_phone: "555".into(),
                bio: "Ears and more".into(),
                registration_id: "MD-SAME01".into(),
            }),
            created_at: ts("2025-01-01 09:00:00"),
        };
        let err = insert_account(&conn, &second, "hash").unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate("registration id")));
    }

    #[test]
    fn doctor_fields_on_patient_row_violate_check() {
        let conn = test_db();
        let result = conn.execute(
            "INSERT INTO accounts (id, name, email, password_hash, role, specialization, created_at)
             VALUES ('x', 'Bad', 'bad@x.test', 'h', 'patient', 'Cardiology', '2025-01-01 00:00:00')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn removed_accounts_are_hidden() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Gone Doc", "MD-GONE01");
        assert!(mark_account_removed(&conn, &doctor.id, &ts("2025-02-01 00:00:00")).unwrap());
        assert!(get_account(&conn, &doctor.id).unwrap().is_none());
        assert!(list_doctors(&conn).unwrap().is_empty());
        assert!(email_exists(&conn, &doctor.email).unwrap());
        assert!(!mark_account_removed(&conn, &doctor.id, &ts("2025-02-02 00:00:00")).unwrap());
    }

    #[test]
    fn doctors_listed_by_name() {
        let conn = test_db();
        make_doctor(&conn, "Zed", "MD-ZZZZZZ");
        make_doctor(&conn, "amy", "MD-AMYAMY");
        make_account(&conn, "Patient Pete", AccountKind::Patient);
        let names: Vec<String> = list_doctors(&conn).unwrap().into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["amy", "Zed"]);
    }

    #[test]
    fn credentials_lookup_returns_hash() {
        let conn = test_db();
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        let (account, hash) = get_account_with_credentials(&conn, &patient.email).unwrap().unwrap();
        assert_eq!(account.id, patient.id);
        assert_eq!(hash, "hash");
        assert!(get_account_with_credentials(&conn, "nobody@x.test").unwrap().is_none());
    }

    #[test]
    fn session_resolves_until_expiry() {
        let conn = test_db();
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        let hash = [7u8; 32];
        insert_session(&conn, &hash, &patient.id, &ts("2025-06-02 00:00:00"), &ts("2025-06-01 00:00:00"))
            .unwrap();

        let found = find_session_identity(&conn, &hash, &ts("2025-06-01 12:00:00")).unwrap();
        assert_eq!(found, Some((patient.id, Role::Patient)));

        let expired = find_session_identity(&conn, &hash, &ts("2025-06-02 00:00:01")).unwrap();
        assert!(expired.is_none());

        assert_eq!(purge_expired_sessions(&conn, &ts("2025-06-03 00:00:00")).unwrap(), 1);
        assert!(!delete_session(&conn, &hash).unwrap());
    }

    #[test]
    fn active_slot_index_rejects_second_active_booking() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let p1 = make_account(&conn, "P One", AccountKind::Patient);
        let p2 = make_account(&conn, "P Two", AccountKind::Patient);

        insert_appointment(&conn, &make_appointment(&doctor, &p1, "2025-06-10", "10:00", AppointmentStatus::Pending))
            .unwrap();
        let err = insert_appointment(
            &conn,
            &make_appointment(&doctor, &p2, "2025-06-10", "10:00", AppointmentStatus::Pending),
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate("appointment slot")));
    }

    #[test]
    fn terminal_bookings_do_not_hold_the_slot() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let p1 = make_account(&conn, "P One", AccountKind::Patient);
        let p2 = make_account(&conn, "P Two", AccountKind::Patient);

        let first = make_appointment(&doctor, &p1, "2025-06-10", "10:00", AppointmentStatus::Pending);
        insert_appointment(&conn, &first).unwrap();
        assert!(update_status_if(
            &conn,
            &first.id,
            AppointmentStatus::Pending,
            AppointmentStatus::Cancelled,
            &ts("2025-06-02 00:00:00"),
        )
        .unwrap());

        let date = first.date;
        let time = first.time;
        assert!(find_active_appointment_at(&conn, &doctor.id, date, time, None).unwrap().is_none());
        insert_appointment(&conn, &make_appointment(&doctor, &p2, "2025-06-10", "10:00", AppointmentStatus::Pending))
            .unwrap();
    }

    #[test]
    fn find_active_respects_exclusion() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        let appt = make_appointment(&doctor, &patient, "2025-06-10", "11:30", AppointmentStatus::Confirmed);
        insert_appointment(&conn, &appt).unwrap();

        let found = find_active_appointment_at(&conn, &doctor.id, appt.date, appt.time, None).unwrap();
        assert_eq!(found, Some(appt.id));
        let excluded =
            find_active_appointment_at(&conn, &doctor.id, appt.date, appt.time, Some(&appt.id)).unwrap();
        assert!(excluded.is_none());
    }

    #[test]
    fn status_compare_and_set_detects_stale_expectation() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        let appt = make_appointment(&doctor, &patient, "2025-06-10", "09:00", AppointmentStatus::Pending);
        insert_appointment(&conn, &appt).unwrap();

        let now = ts("2025-06-02 00:00:00");
        assert!(update_status_if(&conn, &appt.id, AppointmentStatus::Pending, AppointmentStatus::Confirmed, &now)
            .unwrap());
        assert!(!update_status_if(&conn, &appt.id, AppointmentStatus::Pending, AppointmentStatus::Cancelled, &now)
            .unwrap());
        let loaded = get_appointment(&conn, &appt.id).unwrap().unwrap();
        assert_eq!(loaded.status, AppointmentStatus::Confirmed);
    }

    #[test]
    fn active_times_are_sorted_and_skip_terminal() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        for (time, status) in [
            ("14:00", AppointmentStatus::Confirmed),
            ("09:00", AppointmentStatus::Pending),
            ("10:00", AppointmentStatus::Cancelled),
            ("11:00", AppointmentStatus::Completed),
        ] {
            insert_appointment(&conn, &make_appointment(&doctor, &patient, "2025-06-10", time, status)).unwrap();
        }
        insert_appointment(
            &conn,
            &make_appointment(&doctor, &patient, "2025-06-11", "15:00", AppointmentStatus::Pending),
        )
        .unwrap();

        let date = NaiveDate::from_ymd_opt(2025, 6, 10).unwrap();
        let times: Vec<String> = active_times_on(&conn, &doctor.id, date)
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(times, vec!["09:00", "14:00"]);
        assert_eq!(count_active_for_doctor(&conn, &doctor.id).unwrap(), 3);
    }

    #[test]
    fn listings_sorted_newest_first_with_names() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        for (date, time) in [("2025-06-10", "09:00"), ("2025-06-12", "09:00"), ("2025-06-10", "15:30")] {
            insert_appointment(
                &conn,
                &make_appointment(&doctor, &patient, date, time, AppointmentStatus::Pending),
            )
            .unwrap();
        }

        let views = list_appointments_for(&conn, AppointmentParty::Patient, &patient.id).unwrap();
        let order: Vec<String> = views
            .iter()
            .map(|v| format!("{} {}", v.appointment.date, v.appointment.time))
            .collect();
        assert_eq!(order, vec!["2025-06-12 09:00", "2025-06-10 15:30", "2025-06-10 09:00"]);
        assert_eq!(views[0].doctor_name, "Doc");
        assert_eq!(views[0].doctor_specialization.as_deref(), Some("General Practice"));

        let for_doctor = list_appointments_for(&conn, AppointmentParty::Doctor, &doctor.id).unwrap();
        assert_eq!(for_doctor.len(), 3);
        assert_eq!(for_doctor[0].patient_name, "Pat");
    }

    #[test]
    fn schedule_update_only_while_pending() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        let appt = make_appointment(&doctor, &patient, "2025-06-10", "09:00", AppointmentStatus::Confirmed);
        insert_appointment(&conn, &appt).unwrap();

        let moved = update_schedule_if_pending(
            &conn,
            &appt.id,
            appt.date,
            TimeOfDay::parse("10:00").unwrap(),
            "still headache",
            &ts("2025-06-02 00:00:00"),
        )
        .unwrap();
        assert!(!moved);
    }

    #[test]
    fn prescription_round_trips_lines() {
        let conn = test_db();
        let doctor = make_doctor(&conn, "Doc", "MD-DOC001");
        let patient = make_account(&conn, "Pat", AccountKind::Patient);
        let rx = Prescription {
            id: Uuid::new_v4(),
            doctor_id: doctor.id,
            patient_id: patient.id,
            diagnosis: "Sinusitis".into(),
            medicines: vec!["Amoxicillin 500mg".into(), "Saline spray".into()],
            dosage: vec!["1 tablet 3x daily".into()],
            instructions: Some("Drink fluids".into()),
            follow_up_date: NaiveDate::from_ymd_opt(2025, 6, 20),
            issued_on: NaiveDate::from_ymd_opt(2025, 6, 10).unwrap(),
            created_at: ts("2025-06-10 10:00:00"),
        };
        insert_prescription(&conn, &rx).unwrap();

        let loaded = get_prescription(&conn, &rx.id).unwrap().unwrap();
        assert_eq!(loaded, rx);
        assert_eq!(list_prescriptions_for_patient(&conn, &patient.id).unwrap().len(), 1);
    }
}
