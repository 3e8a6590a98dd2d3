//! Accounts: signup, login sessions and the doctor directory.
//!
//! Passwords are stored as PBKDF2 hashes. Bearer tokens are random and
//! only their SHA-256 digest is persisted, so a leaked `sessions` table
//! cannot be replayed.

pub mod password;
pub mod token;

use chrono::{Duration, NaiveDateTime};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::db::{self, DatabaseError};
use crate::models::{Account, AccountKind, DoctorProfile, Role};
use crate::validation::{self, Checks, FieldError};

pub use password::{hash_password, verify_password};
pub use token::{generate_registration_id, generate_token, hash_token};

pub const MIN_PASSWORD_LEN: usize = 6;
pub const MIN_BIO_LEN: usize = 5;

/// Attempts at drawing an unused registration id before giving up.
const REGISTRATION_ID_ATTEMPTS: usize = 8;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    #[error("An account with this email already exists")]
    EmailTaken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Session is missing, expired or revoked")]
    Unauthenticated,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Authorization(&'static str),

    #[error("Doctor still has {0} active appointment(s)")]
    HasActiveAppointments(i64),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl From<Vec<FieldError>> for AccountError {
    fn from(errors: Vec<FieldError>) -> Self {
        AccountError::Validation(errors)
    }
}

/// Caller identity resolved from a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    pub account_id: Uuid,
    pub role: Role,
}

// ═══════════════════════════════════════════════════════════
// Signup
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub specialization: Option<String>,
    #[serde(alias = "experience_years")]
    pub experience: Option<i64>,
    pub phone: Option<String>,
    pub bio: Option<String>,
}

fn validate_doctor_profile(req: &SignupRequest, checks: &mut Checks) -> Option<DoctorProfile> {
    let specialization = checks.check(validation::required_text(
        "specialization",
        req.specialization.as_deref(),
    ));
    let experience_years = match req.experience.map(u32::try_from) {
        Some(Ok(years)) => Some(years),
        Some(Err(_)) => {
            checks.push(FieldError::new("experience", "Experience must be zero or more years"));
            None
        }
        None => {
            checks.push(FieldError::new("experience", "experience is required"));
            None
        }
    };
    let contact_phone = checks.check(validation::required_text("phone", req.phone.as_deref()));
    let bio = checks.check(validation::text_min_len("bio", req.bio.as_deref(), MIN_BIO_LEN));

    Some(DoctorProfile {
        specialization: specialization?,
        experience_years: experience_years?,
        contact_phone: contact_phone?,
        bio: bio?,
        registration_id: String::new(),
    })
}

fn unused_registration_id(conn: &Connection) -> Result<String, AccountError> {
    for _ in 0..REGISTRATION_ID_ATTEMPTS {
        let candidate = generate_registration_id();
        if !db::registration_id_exists(conn, &candidate)? {
            return Ok(candidate);
        }
    }
    Err(DatabaseError::Duplicate("registration id").into())
}

/// Register a patient or doctor. Admins are never self-registered.
pub fn signup(conn: &Connection, req: &SignupRequest, now: NaiveDateTime) -> Result<Account, AccountError> {
    let mut checks = Checks::new();
    let name = checks.check(validation::required_text("name", req.name.as_deref()));
    let email = checks.check(validation::email("email", req.email.as_deref()));
    let password = checks.check(
        req.password
            .as_deref()
            .filter(|p| p.chars().count() >= MIN_PASSWORD_LEN)
            .map(str::to_string)
            .ok_or_else(|| {
                FieldError::new(
                    "password",
                    format!("Password must be at least {MIN_PASSWORD_LEN} characters"),
                )
            }),
    );
    let role = match req.role.as_deref().map(str::trim) {
        Some("patient") => Some(Role::Patient),
        Some("doctor") => Some(Role::Doctor),
        _ => {
            checks.push(FieldError::new("role", "Role must be patient or doctor"));
            None
        }
    };
    let profile = match role {
        Some(Role::Doctor) => validate_doctor_profile(req, &mut checks),
        _ => None,
    };
    checks.finish()?;

    let (Some(name), Some(email), Some(password), Some(role)) = (name, email, password, role) else {
        return Err(AccountError::Validation(Vec::new()));
    };

    if db::email_exists(conn, &email)? {
        return Err(AccountError::EmailTaken);
    }

    let kind = match (role, profile) {
        (Role::Doctor, Some(mut profile)) => {
            profile.registration_id = unused_registration_id(conn)?;
            AccountKind::Doctor(profile)
        }
        (Role::Doctor, None) => return Err(AccountError::Validation(Vec::new())),
        _ => AccountKind::Patient,
    };

    let account = Account {
        id: Uuid::new_v4(),
        name,
        email,
        kind,
        created_at: now,
    };

    match db::insert_account(conn, &account, &hash_password(&password)) {
        Ok(()) => {}
        Err(DatabaseError::Duplicate("email")) => return Err(AccountError::EmailTaken),
        Err(e) => return Err(e.into()),
    }

    tracing::info!(account_id = %account.id, role = %account.role(), "account registered");
    Ok(account)
}

// ═══════════════════════════════════════════════════════════
// Sessions
// ═══════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct LoginSession {
    pub token: String,
    pub expires_at: NaiveDateTime,
    pub account: Account,
}

/// Verify credentials and open a session lasting `ttl_hours`.
pub fn login(
    conn: &Connection,
    email: Option<&str>,
    password: Option<&str>,
    now: NaiveDateTime,
    ttl_hours: i64,
) -> Result<LoginSession, AccountError> {
    let mut checks = Checks::new();
    let email = checks.check(validation::email("email", email));
    let password = checks.check(validation::required_text("password", password));
    checks.finish()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(AccountError::Validation(Vec::new()));
    };

    let Some((account, stored)) = db::get_account_with_credentials(conn, &email)? else {
        return Err(AccountError::InvalidCredentials);
    };
    if !verify_password(&password, &stored) {
        tracing::debug!(account_id = %account.id, "password mismatch");
        return Err(AccountError::InvalidCredentials);
    }

    open_session(conn, account, now, ttl_hours)
}

/// Issue a fresh bearer token for `account`. Only its digest is stored.
pub fn open_session(
    conn: &Connection,
    account: Account,
    now: NaiveDateTime,
    ttl_hours: i64,
) -> Result<LoginSession, AccountError> {
    let token = generate_token();
    let expires_at = now + Duration::hours(ttl_hours);
    db::insert_session(conn, &hash_token(&token), &account.id, &expires_at, &now)?;

    tracing::info!(account_id = %account.id, "session opened");
    Ok(LoginSession {
        token,
        expires_at,
        account,
    })
}

/// Authenticated-identity resolver behind the auth middleware.
pub fn resolve_session(conn: &Connection, token: &str, now: NaiveDateTime) -> Result<Identity, AccountError> {
    let (account_id, role) =
        db::find_session_identity(conn, &hash_token(token), &now)?.ok_or(AccountError::Unauthenticated)?;
    Ok(Identity { account_id, role })
}

/// Close the session for `token`. Returns false if it was already gone.
pub fn logout(conn: &Connection, token: &str) -> Result<bool, AccountError> {
    Ok(db::delete_session(conn, &hash_token(token))?)
}

pub fn get_profile(conn: &Connection, account_id: &Uuid) -> Result<Account, AccountError> {
    db::get_account(conn, account_id)?.ok_or(AccountError::NotFound("Account"))
}

// ═══════════════════════════════════════════════════════════
// Doctor directory
// ═══════════════════════════════════════════════════════════

pub fn list_doctors(conn: &Connection) -> Result<Vec<Account>, AccountError> {
    Ok(db::list_doctors(conn)?)
}

pub fn get_doctor(conn: &Connection, doctor_id: &Uuid) -> Result<Account, AccountError> {
    match db::get_account(conn, doctor_id)? {
        Some(account) if account.is_doctor() => Ok(account),
        _ => Err(AccountError::NotFound("Doctor")),
    }
}

/// Admin-only soft removal. Refused while the doctor holds active
/// appointments; on success every session of the doctor is revoked.
pub fn remove_doctor(
    conn: &Connection,
    actor: &Identity,
    doctor_id: &Uuid,
    now: NaiveDateTime,
) -> Result<Account, AccountError> {
    if actor.role != Role::Admin {
        return Err(AccountError::Authorization("Only admins can remove doctors"));
    }

    let tx = conn.unchecked_transaction().map_err(DatabaseError::from)?;
    let doctor = get_doctor(&tx, doctor_id)?;

    let active = db::count_active_for_doctor(&tx, doctor_id)?;
    if active > 0 {
        return Err(AccountError::HasActiveAppointments(active));
    }

    if !db::mark_account_removed(&tx, doctor_id, &now)? {
        return Err(AccountError::NotFound("Doctor"));
    }
    let revoked = db::delete_sessions_for_account(&tx, doctor_id)?;
    tx.commit().map_err(DatabaseError::from)?;

    tracing::info!(%doctor_id, revoked_sessions = revoked, admin_id = %actor.account_id, "doctor removed");
    Ok(doctor)
}
