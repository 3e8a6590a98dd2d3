//! API error types with structured JSON responses.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::AccountError;
use crate::booking::BookingError;
use crate::db::DatabaseError;
use crate::prescriptions::PrescriptionError;
use crate::validation::FieldError;

/// Error body: `{success: false, code, message, errors?}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<FieldError>>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Validation failed")]
    Validation(Vec<FieldError>),
    /// A well-formed request refused by a business rule (slot taken,
    /// illegal status change, ...). `code` tells the client which.
    #[error("{message}")]
    Rejected { code: &'static str, message: String },
    #[error("Rate limit exceeded")]
    RateLimited { retry_after: u64 },
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut errors = None;
        let (status, code, message) = match &self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "AUTH_REQUIRED",
                "Authentication required".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                "Invalid credentials".to_string(),
            ),
            ApiError::Forbidden(detail) => (StatusCode::FORBIDDEN, "FORBIDDEN", detail.clone()),
            ApiError::NotFound(detail) => (StatusCode::NOT_FOUND, "NOT_FOUND", detail.clone()),
            ApiError::BadRequest(detail) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", detail.clone()),
            ApiError::Validation(fields) => {
                errors = Some(fields.clone());
                (
                    StatusCode::BAD_REQUEST,
                    "VALIDATION_FAILED",
                    "Validation failed".to_string(),
                )
            }
            ApiError::Rejected { code, message } => (StatusCode::BAD_REQUEST, *code, message.clone()),
            ApiError::RateLimited { retry_after } => (
                StatusCode::TOO_MANY_REQUESTS,
                "RATE_LIMITED",
                format!("Rate limit exceeded. Retry after {retry_after}s"),
            ),
            ApiError::Internal(detail) => {
                tracing::error!(detail, "API internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL",
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = ErrorBody {
            success: false,
            code,
            message,
            errors,
        };

        let mut response = (status, Json(body)).into_response();
        if let ApiError::RateLimited { retry_after } = &self {
            if let Ok(val) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", val);
            }
        }
        response
    }
}

impl From<BookingError> for ApiError {
    fn from(err: BookingError) -> Self {
        match err {
            BookingError::Validation(fields) => ApiError::Validation(fields),
            BookingError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            BookingError::Conflict => ApiError::Rejected {
                code: "SLOT_TAKEN",
                message: BookingError::Conflict.to_string(),
            },
            BookingError::Authorization(detail) => ApiError::Forbidden(detail.into()),
            e @ BookingError::InvalidTransition { .. } => ApiError::Rejected {
                code: "INVALID_TRANSITION",
                message: e.to_string(),
            },
            e @ BookingError::NotEditable(_) => ApiError::Rejected {
                code: "NOT_EDITABLE",
                message: e.to_string(),
            },
            BookingError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Validation(fields) => ApiError::Validation(fields),
            e @ AccountError::EmailTaken => ApiError::Rejected {
                code: "EMAIL_TAKEN",
                message: e.to_string(),
            },
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            AccountError::Unauthenticated => ApiError::Unauthorized,
            AccountError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            AccountError::Authorization(detail) => ApiError::Forbidden(detail.into()),
            e @ AccountError::HasActiveAppointments(_) => ApiError::Rejected {
                code: "DOCTOR_HAS_APPOINTMENTS",
                message: e.to_string(),
            },
            AccountError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<PrescriptionError> for ApiError {
    fn from(err: PrescriptionError) -> Self {
        match err {
            PrescriptionError::Validation(fields) => ApiError::Validation(fields),
            PrescriptionError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            PrescriptionError::Authorization(detail) => ApiError::Forbidden(detail.into()),
            PrescriptionError::Database(e) => ApiError::Internal(e.to_string()),
        }
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

/// Leading text of axum's body for a JSON value that parsed but did not fit
/// the target type. The rest is `<path>: <serde message>`, or just the
/// message when the error sits at the document root.
const JSON_DATA_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// Turn a JSON data error into a field error, naming the offending field
/// when serde reported a path and `body` otherwise.
fn json_data_field_error(detail: &str) -> FieldError {
    let detail = detail.strip_prefix(JSON_DATA_PREFIX).unwrap_or(detail);
    match detail.split_once(": ") {
        Some((path, message))
            if !path.is_empty() && !path.contains(char::is_whitespace) && !path.contains('`') =>
        {
            FieldError::new(path, message)
        }
        _ => FieldError::new("body", detail),
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            JsonRejection::JsonDataError(e) => {
                ApiError::Validation(vec![json_data_field_error(&e.body_text())])
            }
            other => ApiError::BadRequest(other.body_text()),
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    use crate::models::AppointmentStatus;

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), 4096).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn unauthorized_returns_401() {
        let response = ApiError::Unauthorized.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = body_json(response).await;
        assert_eq!(json["success"], false);
        assert_eq!(json["code"], "AUTH_REQUIRED");
    }

    #[tokio::test]
    async fn rate_limited_returns_429_with_retry_after() {
        let response = ApiError::RateLimited { retry_after: 60 }.into_response();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(response.headers().get("Retry-After").unwrap(), "60");
        let json = body_json(response).await;
        assert_eq!(json["code"], "RATE_LIMITED");
    }

    #[tokio::test]
    async fn validation_lists_field_errors() {
        let response = ApiError::Validation(vec![FieldError::new("time", "bad time")]).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "VALIDATION_FAILED");
        assert_eq!(json["errors"][0]["field"], "time");
        assert_eq!(json["errors"][0]["message"], "bad time");
    }

    #[test]
    fn json_data_error_names_the_field() {
        let err = json_data_field_error(
            "Failed to deserialize the JSON body into the target type: symptoms: invalid type: integer `5`, expected a string at line 1 column 15",
        );
        assert_eq!(err.field, "symptoms");
        assert!(err.message.starts_with("invalid type: integer `5`"));
    }

    #[test]
    fn json_data_error_at_root_falls_back_to_body() {
        let err = json_data_field_error(
            "Failed to deserialize the JSON body into the target type: invalid type: sequence, expected struct LoginRequest at line 1 column 0",
        );
        assert_eq!(err.field, "body");
        assert!(err.message.starts_with("invalid type: sequence"));
    }

    #[tokio::test]
    async fn slot_conflict_is_400_with_its_own_code() {
        let response = ApiError::from(BookingError::Conflict).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "SLOT_TAKEN");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn invalid_transition_is_400() {
        let err = BookingError::InvalidTransition {
            from: AppointmentStatus::Pending,
            to: AppointmentStatus::Completed,
        };
        let response = ApiError::from(err).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "INVALID_TRANSITION");
    }

    #[tokio::test]
    async fn authorization_is_403() {
        let response = ApiError::from(BookingError::Authorization("nope")).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn not_found_returns_404() {
        let response = ApiError::from(BookingError::NotFound("Doctor")).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["message"], "Doctor not found");
    }

    #[tokio::test]
    async fn internal_returns_500_without_detail() {
        let err: ApiError = DatabaseError::ConstraintViolation("secret table detail".into()).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = body_json(response).await;
        assert_eq!(json["message"], "An internal error occurred");
    }

    #[tokio::test]
    async fn expired_session_maps_to_401() {
        let response = ApiError::from(AccountError::Unauthenticated).into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn email_taken_is_400() {
        let response = ApiError::from(AccountError::EmailTaken).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(json["code"], "EMAIL_TAKEN");
    }
}
