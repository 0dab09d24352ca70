//! Two-phase password reset protocol.
//!
//! Phase 1 (`forgot_password`) never reveals whether the identity exists: the
//! response body is identical either way, a token is stored only when the
//! account exists, and email dispatch failure is swallowed. Phase 2
//! (`reset_password`) redeems the token, replacing the credential and
//! clearing token + expiry atomically.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::password::hash_password;
use super::state::AuthState;
use super::storage::{ResetOutcome, consume_reset_token, set_reset_token};
use super::tokens::{generate_token, hash_token};
use super::types::{ForgotPasswordRequest, MessageResponse, ResetPasswordRequest};
use crate::api::email::reset_email;
use crate::api::error::ApiError;

const RESET_REQUESTED_MESSAGE: &str =
    "If that email is registered, you'll receive a reset link shortly.";

#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Same response whether or not the email is registered", body = MessageResponse),
        (status = 400, description = "Missing email", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ForgotPasswordRequest>>,
) -> Result<Response, ApiError> {
    let email = payload
        .map(|Json(request)| request.email.trim().to_string())
        .unwrap_or_default();
    if email.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Email is required".to_string(),
            }),
        )
            .into_response());
    }

    let token = generate_token()?;
    let token_hash = hash_token(&token);

    let stored = set_reset_token(
        &pool,
        &email,
        &token_hash,
        auth_state.config().reset_token_ttl_seconds(),
    )
    .await?;

    if stored {
        // Delivery failure is swallowed: the token is useless without the
        // email and expires within the configured window anyway.
        let message = reset_email(auth_state.config().base_url(), &email, &token);
        if let Err(err) = auth_state.email_sender().send(&message) {
            error!("Failed to send password reset email: {err}");
        }
    }

    Ok(reset_requested())
}

#[utoipa::path(
    post,
    path = "/v1/auth/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password replaced, token cleared", body = MessageResponse),
        (status = 400, description = "Missing fields, unknown token, or expired token", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn reset_password(
    pool: Extension<PgPool>,
    payload: Option<Json<ResetPasswordRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Ok(missing_fields());
    };
    let token = request.token.trim();
    if token.is_empty() || request.new_password.is_empty() {
        return Ok(missing_fields());
    }

    let token_hash = hash_token(token);
    let new_password_hash = hash_password(&request.new_password)?;

    match consume_reset_token(&pool, &token_hash, &new_password_hash).await? {
        ResetOutcome::Reset => Ok((
            StatusCode::OK,
            Json(MessageResponse {
                message: "Password has been reset successfully".to_string(),
            }),
        )
            .into_response()),
        ResetOutcome::Expired => Err(ApiError::Expired),
        ResetOutcome::NotFound => Err(ApiError::InvalidToken),
    }
}

fn reset_requested() -> Response {
    (
        StatusCode::OK,
        Json(MessageResponse {
            message: RESET_REQUESTED_MESSAGE.to_string(),
        }),
    )
        .into_response()
}

fn missing_fields() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse {
            message: "Token and new password are required".to_string(),
        }),
    )
        .into_response()
}
