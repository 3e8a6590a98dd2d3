//! Shared fixtures for unit tests.

use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::Connection;
use uuid::Uuid;

use crate::db::{insert_account, open_memory_database};
use crate::models::{Account, AccountKind, DoctorProfile};

pub fn memory_db() -> Connection {
    open_memory_database().unwrap()
}

pub fn date(raw: &str) -> NaiveDate {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").unwrap()
}

/// Midday on the given day.
pub fn noon(raw: &str) -> NaiveDateTime {
    date(raw).and_hms_opt(12, 0, 0).unwrap()
}

fn seed(conn: &Connection, name: &str, kind: AccountKind) -> Account {
    let account = Account {
        id: Uuid::new_v4(),
        name: name.to_string(),
        email: format!("{}@medibook.test", name.to_lowercase().replace(' ', ".")),
        kind,
        created_at: noon("2025-01-01"),
    };
    insert_account(conn, &account, "unused-hash").unwrap();
    account
}

pub fn seed_patient(conn: &Connection, name: &str) -> Account {
    seed(conn, name, AccountKind::Patient)
}

pub fn seed_admin(conn: &Connection, name: &str) -> Account {
    seed(conn, name, AccountKind::Admin)
}

pub fn seed_doctor(conn: &Connection, name: &str) -> Account {
    let registration_id = format!("MD-{}", &Uuid::new_v4().simple().to_string()[..6].to_uppercase());
    seed(
        conn,
        name,
        AccountKind::Doctor(DoctorProfile {
            specialization: "General Practice".into(),
            experience_years: 10,
            contact_phone: "555-0100".into(),
            bio: "Primary care physician".into(),
            registration_id,
        }),
    )
}
