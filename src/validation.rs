//! Field validation with a single error envelope.
//!
//! Every validator reports failures as `FieldError { field, message }`.
//! `Checks` collects them so a request reports all bad fields at once.

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::TimeOfDay;

static DATE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Accumulates field errors across several validators.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<FieldError>,
}

impl Checks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the error of a failed check; pass the value of a good one through.
    pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.errors.push(e);
                None
            }
        }
    }

    pub fn push(&mut self, error: FieldError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Result<(), Vec<FieldError>> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(self.errors)
        }
    }
}

/// Trimmed, non-empty text.
pub fn required_text(field: &str, value: Option<&str>) -> Result<String, FieldError> {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => Ok(v.to_string()),
        _ => Err(FieldError::new(field, format!("{field} is required"))),
    }
}

/// Trimmed text of at least `min` characters.
pub fn text_min_len(field: &str, value: Option<&str>, min: usize) -> Result<String, FieldError> {
    let text = required_text(field, value)?;
    if text.chars().count() < min {
        return Err(FieldError::new(
            field,
            format!("{field} must be at least {min} characters"),
        ));
    }
    Ok(text)
}

/// Optional free text; blank collapses to `None`.
pub fn optional_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Strict `YYYY-MM-DD` calendar date.
pub fn calendar_date(field: &str, value: Option<&str>) -> Result<NaiveDate, FieldError> {
    let raw = required_text(field, value)?;
    if !DATE_SHAPE.is_match(&raw) {
        return Err(FieldError::new(field, "Date must be in YYYY-MM-DD format"));
    }
    NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
        .map_err(|_| FieldError::new(field, "Date is not a valid calendar date"))
}

/// Reject dates strictly before `today`.
pub fn not_in_past(field: &str, date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, FieldError> {
    if date < today {
        return Err(FieldError::new(field, "Date cannot be in the past"));
    }
    Ok(date)
}

/// 24-hour `HH:MM`.
pub fn time_of_day(field: &str, value: Option<&str>) -> Result<TimeOfDay, FieldError> {
    let raw = required_text(field, value)?;
    TimeOfDay::parse(&raw)
        .map_err(|_| FieldError::new(field, "Time must be in HH:MM format (24-hour)"))
}

/// Email address, normalized to lowercase.
pub fn email(field: &str, value: Option<&str>) -> Result<String, FieldError> {
    let raw = required_text(field, value)?;
    if !EMAIL_SHAPE.is_match(&raw) {
        return Err(FieldError::new(field, "Please provide a valid email"));
    }
    Ok(raw.to_lowercase())
}

pub fn uuid(field: &str, value: Option<&str>) -> Result<Uuid, FieldError> {
    let raw = required_text(field, value)?;
    Uuid::parse_str(&raw).map_err(|_| FieldError::new(field, format!("{field} is not a valid id")))
}
