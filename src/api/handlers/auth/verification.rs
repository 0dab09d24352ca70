//! Email verification endpoint.

use axum::{
    Json,
    extract::{Extension, Query},
    response::IntoResponse,
};
use sqlx::PgPool;

use super::storage::consume_verification_token;
use super::tokens::hash_token;
use super::types::{VerifyParams, VerifyResponse};
use crate::api::error::ApiError;

/// Redeem a verification link token, moving the account from `unverified` to
/// `active` in one atomic statement. Fails closed: a token that does not
/// match a currently-unverified account is rejected without revealing which
/// condition failed. Replaying a consumed token fails the same way.
#[utoipa::path(
    get,
    path = "/v1/auth/verify",
    params(
        ("token" = Option<String>, Query, description = "Verification token from the emailed link")
    ),
    responses(
        (status = 200, description = "Email verified", body = VerifyResponse),
        (status = 400, description = "Missing, invalid, consumed, or expired token", body = String)
    ),
    tag = "auth"
)]
pub async fn verify(
    pool: Extension<PgPool>,
    Query(params): Query<VerifyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let token = params.token.unwrap_or_default();
    let token = token.trim();
    if token.is_empty() {
        return Err(ApiError::InvalidToken);
    }

    let token_hash = hash_token(token);
    if consume_verification_token(&pool, &token_hash).await? {
        Ok(Json(VerifyResponse {
            success: true,
            message: "Email verified".to_string(),
        }))
    } else {
        Err(ApiError::InvalidToken)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;
    use sqlx::postgres::PgPoolOptions;

    #[tokio::test]
    async fn verify_missing_token() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let result = verify(Extension(pool), Query(VerifyParams { token: None })).await;
        let response = result.err().expect("invalid token").into_response();
        assert_eq!(response.status(), axum::http::StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn verify_blank_token() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let result = verify(
            Extension(pool),
            Query(VerifyParams {
                token: Some("   ".to_string()),
            }),
        )
        .await;
        assert!(result.is_err());
    }
}
