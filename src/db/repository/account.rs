use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_timestamp, parse_uuid};
use crate::db::{is_unique_violation, DatabaseError};
use crate::models::*;

const ACCOUNT_COLUMNS: &str = "id, name, email, role, specialization, experience_years,
     contact_phone, bio, registration_id, created_at";

/// Raw column values, converted outside the rusqlite row closure so that
/// enum and id parse failures surface as `DatabaseError`.
type AccountRow = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<i64>,
    Option<String>,
    Option<String>,
    Option<String>,
    String,
);

fn read_account_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<AccountRow> {
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

fn account_from_row(raw: AccountRow) -> Result<Account, DatabaseError> {
    let (id, name, email, role, specialization, experience, phone, bio, registration_id, created_at) =
        raw;

    let kind = match Role::from_str(&role)? {
        Role::Patient => AccountKind::Patient,
        Role::Admin => AccountKind::Admin,
        Role::Doctor => match (specialization, experience, phone, bio, registration_id) {
            (Some(specialization), Some(experience), Some(contact_phone), Some(bio), Some(registration_id)) => {
                AccountKind::Doctor(DoctorProfile {
                    specialization,
                    experience_years: u32::try_from(experience).map_err(|_| DatabaseError::CorruptRow {
                        table: "accounts",
                        reason: format!("negative experience for {id}"),
                    })?,
                    contact_phone,
                    bio,
                    registration_id,
                })
            }
            _ => {
                return Err(DatabaseError::CorruptRow {
                    table: "accounts",
                    reason: format!("doctor {id} is missing profile attributes"),
                })
            }
        },
    };

    Ok(Account {
        id: parse_uuid("accounts", &id)?,
        name,
        email,
        kind,
        created_at: parse_timestamp("accounts", &created_at)?,
    })
}

pub fn insert_account(
    conn: &Connection,
    account: &Account,
    password_hash: &str,
) -> Result<(), DatabaseError> {
    let profile = account.doctor_profile();
    let result = conn.execute(
        "INSERT INTO accounts (id, name, email, password_hash, role, specialization,
         experience_years, contact_phone, bio, registration_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            account.id.to_string(),
            account.name,
            account.email,
            password_hash,
            account.role().as_str(),
            profile.map(|p| p.specialization.as_str()),
            profile.map(|p| i64::from(p.experience_years)),
            profile.map(|p| p.contact_phone.as_str()),
            profile.map(|p| p.bio.as_str()),
            profile.map(|p| p.registration_id.as_str()),
            format_timestamp(&account.created_at),
        ],
    );

    match result {
        Ok(_) => Ok(()),
        Err(e) if is_unique_violation(&e) => {
            if e.to_string().contains("registration_id") {
                Err(DatabaseError::Duplicate("registration id"))
            } else {
                Err(DatabaseError::Duplicate("email"))
            }
        }
        Err(e) => Err(e.into()),
    }
}

/// Look up a live (not removed) account by id.
pub fn get_account(conn: &Connection, id: &Uuid) -> Result<Option<Account>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = ?1 AND removed_at IS NULL"),
            params![id.to_string()],
            read_account_row,
        )
        .optional()?;
    raw.map(account_from_row).transpose()
}

/// Look up a live account by email together with its stored password hash.
pub fn get_account_with_credentials(
    conn: &Connection,
    email: &str,
) -> Result<Option<(Account, String)>, DatabaseError> {
    let raw = conn
        .query_row(
            &format!(
                "SELECT {ACCOUNT_COLUMNS}, password_hash FROM accounts
                 WHERE email = ?1 AND removed_at IS NULL"
            ),
            params![email],
            |row| Ok((read_account_row(row)?, row.get::<_, String>(10)?)),
        )
        .optional()?;

    match raw {
        Some((row, hash)) => Ok(Some((account_from_row(row)?, hash))),
        None => Ok(None),
    }
}

/// Whether any account, removed or not, already uses `email`.
pub fn email_exists(conn: &Connection, email: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

pub fn registration_id_exists(conn: &Connection, registration_id: &str) -> Result<bool, DatabaseError> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM accounts WHERE registration_id = ?1",
        params![registration_id],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Live doctors, sorted by name.
pub fn list_doctors(conn: &Connection) -> Result<Vec<Account>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ACCOUNT_COLUMNS} FROM accounts
         WHERE role = 'doctor' AND removed_at IS NULL
         ORDER BY name COLLATE NOCASE, id"
    ))?;
    let rows = stmt.query_map([], read_account_row)?;

    let mut doctors = Vec::new();
    for row in rows {
        doctors.push(account_from_row(row?)?);
    }
    Ok(doctors)
}

/// Soft-remove an account. Returns false if it was absent or already removed.
pub fn mark_account_removed(
    conn: &Connection,
    id: &Uuid,
    removed_at: &NaiveDateTime,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE accounts SET removed_at = ?2 WHERE id = ?1 AND removed_at IS NULL",
        params![id.to_string(), format_timestamp(removed_at)],
    )?;
    Ok(changed > 0)
}
