use std::str::FromStr;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

use super::{format_timestamp, parse_uuid};
use crate::db::DatabaseError;
use crate::models::Role;

pub fn insert_session(
    conn: &Connection,
    token_hash: &[u8; 32],
    account_id: &Uuid,
    expires_at: &NaiveDateTime,
    created_at: &NaiveDateTime,
) -> Result<(), DatabaseError> {
    conn.execute(
        "INSERT INTO sessions (token_hash, account_id, expires_at, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            &token_hash[..],
            account_id.to_string(),
            format_timestamp(expires_at),
            format_timestamp(created_at),
        ],
    )?;
    Ok(())
}

/// Resolve an unexpired session to the owning live account's id and role.
pub fn find_session_identity(
    conn: &Connection,
    token_hash: &[u8; 32],
    now: &NaiveDateTime,
) -> Result<Option<(Uuid, Role)>, DatabaseError> {
    let raw = conn
        .query_row(
            "SELECT a.id, a.role FROM sessions s
             JOIN accounts a ON a.id = s.account_id
             WHERE s.token_hash = ?1 AND s.expires_at > ?2 AND a.removed_at IS NULL",
            params![&token_hash[..], format_timestamp(now)],
            |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
        )
        .optional()?;

    match raw {
        Some((id, role)) => Ok(Some((parse_uuid("sessions", &id)?, Role::from_str(&role)?))),
        None => Ok(None),
    }
}

pub fn delete_session(conn: &Connection, token_hash: &[u8; 32]) -> Result<bool, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE token_hash = ?1",
        params![&token_hash[..]],
    )?;
    Ok(deleted > 0)
}

pub fn delete_sessions_for_account(conn: &Connection, account_id: &Uuid) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE account_id = ?1",
        params![account_id.to_string()],
    )?;
    Ok(deleted)
}

pub fn purge_expired_sessions(conn: &Connection, now: &NaiveDateTime) -> Result<usize, DatabaseError> {
    let deleted = conn.execute(
        "DELETE FROM sessions WHERE expires_at <= ?1",
        params![format_timestamp(now)],
    )?;
    Ok(deleted)
}
