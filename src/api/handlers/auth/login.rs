//! Login endpoints for farm operators and administrators.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::password::verify_password;
use super::session::{SessionClaims, session_cookie};
use super::state::AuthState;
use super::storage::{lookup_administrator, lookup_farm_account};
use super::types::{AdminLoginRequest, LoginRequest, MessageResponse, NotVerifiedResponse};
use crate::api::error::ApiError;
use crate::api::handlers::accounts::types::AccountStatus;
use crate::api::handlers::audit::{self, EventType};

/// Farm login. Guards are evaluated in a fixed order, each short-circuiting:
/// unknown identity, credential mismatch, suspended/deactivated status,
/// unverified status, then success. Unknown identity and credential mismatch
/// share one boundary message; the audit trail still distinguishes them.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = MessageResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Unknown identity or wrong password", body = MessageResponse),
        (status = 403, description = "Account suspended, deactivated, or not verified", body = NotVerifiedResponse)
    ),
    tag = "auth"
)]
pub async fn login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<LoginRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Ok(missing_fields());
    };
    let identifier = request.identifier.trim();
    if identifier.is_empty() || request.password.is_empty() {
        return Ok(missing_fields());
    }

    let record = match lookup_farm_account(&pool, identifier).await {
        Ok(record) => record,
        Err(err) => return Err(ApiError::Internal(err)),
    };

    // Identity not found: log the submitted identifier, there is nothing to resolve.
    let Some(record) = record else {
        audit::record(&pool, EventType::LoginFarmFailed, identifier, None).await;
        return Err(ApiError::InvalidCredential);
    };

    // Credential check runs before the status gates; observable error
    // precedence depends on this order.
    if !verify_password(&request.password, &record.password_hash) {
        audit::record(
            &pool,
            EventType::LoginFarmFailed,
            &record.email,
            Some(&record.farm_name),
        )
        .await;
        return Err(ApiError::InvalidCredential);
    }

    match record.status {
        AccountStatus::Suspended => {
            audit::record(
                &pool,
                EventType::LoginFarmBlocked,
                &record.email,
                Some(&record.farm_name),
            )
            .await;
            Err(ApiError::Forbidden(
                "Your account has been suspended. Please contact the administrator.".to_string(),
            ))
        }
        AccountStatus::Deactivated => {
            audit::record(
                &pool,
                EventType::LoginFarmBlocked,
                &record.email,
                Some(&record.farm_name),
            )
            .await;
            Err(ApiError::Forbidden(
                "Your account has been deactivated.".to_string(),
            ))
        }
        // Not logged: the account holder simply has not finished signup yet.
        AccountStatus::Unverified => Ok((
            StatusCode::FORBIDDEN,
            Json(NotVerifiedResponse {
                message: "Account not verified".to_string(),
                not_verified: true,
                email: record.email,
            }),
        )
            .into_response()),
        AccountStatus::Active => {
            let claims = SessionClaims::farm(
                record.farm_id,
                &record.farm_name,
                &record.email,
                auth_state.config().session_ttl_seconds(),
            );
            let token = auth_state.session_keys().issue(&claims)?;
            let cookie = session_cookie(auth_state.config(), &token)
                .map_err(|err| anyhow::anyhow!("failed to build session cookie: {err}"))?;

            audit::record(
                &pool,
                EventType::LoginFarm,
                &record.email,
                Some(&record.farm_name),
            )
            .await;

            let mut headers = HeaderMap::new();
            headers.insert(SET_COOKIE, cookie);
            Ok((
                StatusCode::OK,
                headers,
                Json(MessageResponse {
                    message: "Logged in".to_string(),
                }),
            )
                .into_response())
        }
    }
}

/// Administrator login. Only two outcomes: unknown email and wrong password
/// collapse into one failure class.
#[utoipa::path(
    post,
    path = "/v1/auth/admin/login",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Login successful, session cookie set", body = MessageResponse),
        (status = 400, description = "Missing fields", body = MessageResponse),
        (status = 401, description = "Invalid credentials", body = MessageResponse)
    ),
    tag = "auth"
)]
pub async fn admin_login(
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<AdminLoginRequest>>,
) -> Result<Response, ApiError> {
    let Some(Json(request)) = payload else {
        return Ok(missing_fields());
    };
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Ok(missing_fields());
    }

    let record = match lookup_administrator(&pool, email).await {
        Ok(record) => record,
        Err(err) => return Err(ApiError::Internal(err)),
    };

    let Some(record) = record else {
        audit::record(&pool, EventType::LoginAdminFailed, email, None).await;
        return Err(ApiError::InvalidCredential);
    };

    if !verify_password(&request.password, &record.password_hash) {
        audit::record(&pool, EventType::LoginAdminFailed, &record.email, None).await;
        return Err(ApiError::InvalidCredential);
    }

    let claims = SessionClaims::admin(
        record.admin_id,
        &record.username,
        &record.email,
        auth_state.config().session_ttl_seconds(),
    );
    let token = auth_state.session_keys().issue(&claims)?;
    let cookie = session_cookie(auth_state.config(), &token).map_err(|err| {
        error!("Failed to build session cookie: {err}");
        anyhow::anyhow!("failed to build session cookie")
    })?;

    audit::record(&pool, EventType::LoginAdmin, &record.email, None).await;

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie);
    Ok((
        StatusCode::OK,
        headers,
        Json(MessageResponse {
            message: "Logged in".to_string(),
        }),
    )
        .into_response())
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
