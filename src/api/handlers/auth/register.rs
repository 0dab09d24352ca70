//! Farm account registration and verification resend.

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
use super::storage::{
    ResendOutcome, SignupOutcome, create_unverified_account, rotate_verification_token,
};
use super::tokens::{generate_token, hash_token};
use super::types::{
    MessageResponse, RegisterRequest, RegisterResponse, ResendVerificationRequest, VerifyResponse,
};
use crate::api::email::verification_email;
use crate::api::error::ApiError;
use crate::api::handlers::valid_email;

/// Register a farm account. The account lands in `unverified` status and the
/// verification email is dispatched inline; delivery failure is non-fatal and
/// reported through `email_sent` so the client can invite a resend.
#[utoipa::path(
    post,
    path = "/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created, verification email sent", body = RegisterResponse),
        (status = 200, description = "Account created, verification email failed to send", body = RegisterResponse),
        (status = 400, description = "Missing fields, invalid email, or identity already registered", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn register(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<RegisterRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Ok(missing_fields());
    };
    let farm_name = request.farm_name.trim();
    let location = request.location.trim();
    let email = request.email.trim();
    if farm_name.is_empty() || location.is_empty() || email.is_empty() || request.password.is_empty()
    {
        return Ok(missing_fields());
    }
    if !valid_email(email) {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Invalid email".to_string(),
            }),
        )
            .into_response());
    }

    let password_hash = hash_password(&request.password)?;
    let token = generate_token()?;
    let token_hash = hash_token(&token);

    let outcome = create_unverified_account(
        &pool,
        farm_name,
        location,
        email,
        &password_hash,
        &token_hash,
        auth_state.config().verification_token_ttl_seconds(),
    )
    .await?;

    if let SignupOutcome::Conflict = outcome {
        return Err(ApiError::Conflict);
    }

    let message = verification_email(auth_state.config().base_url(), email, &token);
    match auth_state.email_sender().send(&message) {
        Ok(()) => Ok((
            StatusCode::CREATED,
            Json(RegisterResponse {
                message: "Registered successfully — verification email sent.".to_string(),
                email_sent: true,
            }),
        )
            .into_response()),
        Err(err) => {
            // The account exists either way; the caller is told delivery
            // missed so it can offer a resend.
            error!("Failed to send verification email: {err}");
            Ok((
                StatusCode::OK,
                Json(RegisterResponse {
                    message: "Account created but verification email failed to send.".to_string(),
                    email_sent: false,
                }),
            )
                .into_response())
        }
    }
}

/// Resend the verification email. Idempotent: each call rotates the token,
/// invalidating the previous one.
#[utoipa::path(
    post,
    path = "/v1/auth/resend-verification",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification email resent", body = VerifyResponse),
        (status = 400, description = "Missing email or account already verified", body = MessageResponse),
        (status = 404, description = "Account not found", body = MessageResponse),
        (status = 500, description = "Email delivery failed", body = VerifyResponse)
    ),
    tag = "auth"
)]
pub async fn resend_verification(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Email required".to_string(),
            }),
        )
            .into_response());
    };
    let email = request.email.trim();
    if email.is_empty() {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Email required".to_string(),
            }),
        )
            .into_response());
    }

    let token = generate_token()?;
    let token_hash = hash_token(&token);

    let outcome = rotate_verification_token(
        &pool,
        email,
        &token_hash,
        auth_state.config().verification_token_ttl_seconds(),
    )
    .await?;

    match outcome {
        ResendOutcome::NotFound => Err(ApiError::NotFound("Account not found".to_string())),
        ResendOutcome::AlreadyVerified => Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Already verified".to_string(),
            }),
        )
            .into_response()),
        ResendOutcome::Rotated => {
            let message = verification_email(auth_state.config().base_url(), email, &token);
            match auth_state.email_sender().send(&message) {
                Ok(()) => Ok((
                    StatusCode::OK,
                    Json(VerifyResponse {
                        success: true,
                        message: "Verification email resent".to_string(),
                    }),
                )
                    .into_response()),
                Err(err) => {
                    error!("Failed to resend verification email: {err}");
                    Ok((
                        StatusCode::INTERNAL_SERVER_ERROR,
                        Json(VerifyResponse {
                            success: false,
                            message: "Failed to send email".to_string(),
                        }),
                    )
                        .into_response())
                }
            }
        }
    }
}

fn missing_fields() -> Response {
    (
        StatusCode::BAD_REQUEST,
        Json(MessageResponse {
            message: "Missing fields".to_string(),
        }),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use crate::api::handlers::auth::AuthConfig;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    fn auth_state() -> Arc<AuthState> {
        Arc::new(AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()),
            &SecretString::from("super-secret".to_string()),
            Arc::new(LogEmailSender),
        ))
    }

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    #[tokio::test]
    async fn register_missing_payload() {
        let response = register(Extension(lazy_pool()), Extension(auth_state()), None)
            .await
            .expect("response")
            .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn register_rejects_invalid_email() {
        let response = register(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(RegisterRequest {
                farm_name: "FarmA".to_string(),
                location: "Bantayan".to_string(),
                email: "not-an-email".to_string(),
                password: "pw1".to_string(),
            })),
        )
        .await
        .expect("response")
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn resend_requires_email() {
        let response = resend_verification(
            Extension(lazy_pool()),
            Extension(auth_state()),
            Some(Json(ResendVerificationRequest {
                email: " ".to_string(),
            })),
        )
        .await
        .expect("response")
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
