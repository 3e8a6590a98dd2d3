//! Account endpoints.
//!
//! - `POST /api/auth/signup`: register and open a session
//! - `POST /api/auth/login`: exchange credentials for a bearer token
//! - `GET /api/auth/me`: caller's account
//! - `POST /api/auth/logout`: revoke the current token

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Deserialize;

use crate::accounts::{self, Identity, LoginSession, SignupRequest};
use crate::api::error::ApiError;
use crate::api::types::{ApiContext, ApiResponse, BearerToken};
use crate::models::Account;

pub async fn signup(
    State(ctx): State<ApiContext>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<LoginSession>>), ApiError> {
    let Json(req) = payload?;
    let ttl_hours = ctx.state.config.session_ttl_hours;

    let session = ctx
        .with_db(move |conn, now| {
            let account = accounts::signup(conn, &req, now)?;
            accounts::open_session(conn, account, now, ttl_hours)
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(session).with_message("Account created")),
    ))
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn login(
    State(ctx): State<ApiContext>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<LoginSession>>, ApiError> {
    let Json(req) = payload?;
    let ttl_hours = ctx.state.config.session_ttl_hours;

    let session = ctx
        .with_db(move |conn, now| {
            accounts::login(conn, req.email.as_deref(), req.password.as_deref(), now, ttl_hours)
        })
        .await?;

    Ok(Json(ApiResponse::ok(session)))
}

pub async fn me(
    State(ctx): State<ApiContext>,
    Extension(identity): Extension<Identity>,
) -> Result<Json<ApiResponse<Account>>, ApiError> {
    let account = ctx
        .with_db(move |conn, _| accounts::get_profile(conn, &identity.account_id))
        .await?;
    Ok(Json(ApiResponse::ok(account)))
}

pub async fn logout(
    State(ctx): State<ApiContext>,
    Extension(BearerToken(token)): Extension<BearerToken>,
) -> Result<Json<ApiResponse<serde_json::Value>>, ApiError> {
    ctx.with_db(move |conn, _| accounts::logout(conn, &token)).await?;
    Ok(Json(
        ApiResponse::ok(serde_json::json!({})).with_message("Logged out"),
    ))
}
