//! Administrator account management endpoints.
//!
//! Status transitions are triggered here and nowhere else outside the auth
//! flows: suspend, reinstate, deactivate, and the hard delete that is only
//! legal against `deactivated` accounts. Every transition attempt appends an
//! audit record with the administrator as actor.

mod storage;
pub mod types;

use axum::{
    Json,
    extract::{Extension, Path},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use self::types::{AccountsResponse, StatusAction, StatusActionRequest};
use super::auth::types::MessageResponse;
use super::auth::{AuthState, session::require_admin};
use crate::api::error::ApiError;
use crate::api::handlers::audit::{self, EventType};

const fn action_event(action: StatusAction) -> EventType {
    match action {
        StatusAction::Suspend => EventType::SuspendFarm,
        StatusAction::Reinstate => EventType::ReinstateFarm,
        StatusAction::Deactivate => EventType::DeactivateFarm,
    }
}

#[utoipa::path(
    get,
    path = "/v1/accounts",
    responses(
        (status = 200, description = "All farm accounts, newest first", body = AccountsResponse),
        (status = 401, description = "Missing or invalid administrator session", body = String)
    ),
    tag = "accounts"
)]
pub async fn list_accounts(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &auth_state)?;

    let accounts = storage::list_accounts(&pool).await?;
    Ok(Json(AccountsResponse { accounts }))
}

/// Apply an allow-listed status action to a farm account. Unknown actions
/// never reach this handler; they fail request deserialization.
#[utoipa::path(
    patch,
    path = "/v1/accounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Farm account id")
    ),
    request_body = StatusActionRequest,
    responses(
        (status = 200, description = "Status updated", body = MessageResponse),
        (status = 400, description = "Missing or invalid action", body = MessageResponse),
        (status = 401, description = "Missing or invalid administrator session", body = String),
        (status = 404, description = "Farm account not found", body = MessageResponse)
    ),
    tag = "accounts"
)]
pub async fn update_account_status(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    payload: Option<Json<StatusActionRequest>>,
) -> Result<Response, ApiError> {
    let claims = require_admin(&headers, &auth_state)?;

    let Some(Json(request)) = payload else {
        return Ok((
            StatusCode::BAD_REQUEST,
            Json(MessageResponse {
                message: "Invalid action".to_string(),
            }),
        )
            .into_response());
    };

    let action = request.action;
    let target = storage::set_account_status(&pool, id, action.target_status())
        .await?
        .ok_or_else(|| ApiError::NotFound("Farm account not found".to_string()))?;

    audit::record(
        &pool,
        action_event(action),
        &claims.email,
        Some(&target.farm_name),
    )
    .await;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: format!("Farm account {} success", action.as_str()),
        }),
    )
        .into_response())
}

/// Permanently erase a `deactivated` farm account. Any other status reads as
/// not-found and performs no mutation.
#[utoipa::path(
    delete,
    path = "/v1/accounts/{id}",
    params(
        ("id" = Uuid, Path, description = "Farm account id")
    ),
    responses(
        (status = 200, description = "Account permanently deleted", body = MessageResponse),
        (status = 401, description = "Missing or invalid administrator session", body = String),
        (status = 404, description = "No deactivated account with this id", body = MessageResponse)
    ),
    tag = "accounts"
)]
pub async fn delete_account(
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
) -> Result<Response, ApiError> {
    let claims = require_admin(&headers, &auth_state)?;

    if !storage::delete_deactivated_account(&pool, id).await? {
        return Err(ApiError::NotFound(
            "Deactivated farm account not found or already deleted".to_string(),
        ));
    }

    audit::record(
        &pool,
        EventType::DeleteFarm,
        &claims.email,
        Some(&format!("farm_id:{id}")),
    )
    .await;

    Ok((
        StatusCode::OK,
        Json(MessageResponse {
            message: "Farm account permanently deleted".to_string(),
        }),
    )
        .into_response())
}
