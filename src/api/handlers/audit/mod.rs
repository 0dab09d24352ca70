//! Append-only audit trail for security-relevant actions.
//!
//! Every state transition and authentication attempt appends a `system_logs`
//! row. Writes are best-effort: a failed append is reported to operational
//! monitoring via an error-level tracing event and never fails or rolls back
//! the transition it documents. Rows are never updated or deleted here.

mod storage;

use axum::{
    Json,
    extract::{Extension, Query},
    http::HeaderMap,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};

use super::auth::{AuthState, session::require_admin};
use crate::api::error::ApiError;

/// Audit event vocabulary. The wire form is the upper-snake string, which is
/// what operators filter on.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventType {
    LoginFarm,
    LoginFarmFailed,
    LoginFarmBlocked,
    LoginAdmin,
    LoginAdminFailed,
    SuspendFarm,
    ReinstateFarm,
    DeactivateFarm,
    DeleteFarm,
}

impl EventType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::LoginFarm => "LOGIN_FARM",
            Self::LoginFarmFailed => "LOGIN_FARM_FAILED",
            Self::LoginFarmBlocked => "LOGIN_FARM_BLOCKED",
            Self::LoginAdmin => "LOGIN_ADMIN",
            Self::LoginAdminFailed => "LOGIN_ADMIN_FAILED",
            Self::SuspendFarm => "SUSPEND_FARM",
            Self::ReinstateFarm => "REINSTATE_FARM",
            Self::DeactivateFarm => "DEACTIVATE_FARM",
            Self::DeleteFarm => "DELETE_FARM",
        }
    }
}

/// Append an audit record. Fire-and-forget: failures are logged for
/// monitoring and otherwise swallowed.
pub async fn record(pool: &PgPool, event: EventType, actor: &str, target: Option<&str>) {
    if let Err(err) = storage::insert_event(pool, event.as_str(), actor, target).await {
        error!(
            event_type = event.as_str(),
            "failed to write audit record: {err}"
        );
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AuditLogEntry {
    pub log_id: i64,
    pub event_type: String,
    pub actor_email: String,
    pub target_farm: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LogsResponse {
    pub logs: Vec<AuditLogEntry>,
}

#[derive(Deserialize, IntoParams, Debug, Default)]
pub struct LogQuery {
    /// Exact event type, e.g. `LOGIN_FARM_BLOCKED`.
    pub event_type: Option<String>,
    /// Substring match against the actor identity.
    pub actor_email: Option<String>,
    /// Substring match against the target identity.
    pub target_farm: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
}

#[utoipa::path(
    get,
    path = "/v1/audit/logs",
    params(LogQuery),
    responses(
        (status = 200, description = "Matching audit records, newest first", body = LogsResponse),
        (status = 401, description = "Missing or invalid administrator session", body = String)
    ),
    tag = "audit"
)]
pub async fn list_logs(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    auth_state: Extension<Arc<AuthState>>,
    Query(filter): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    require_admin(&headers, &auth_state)?;

    let logs = storage::fetch_events(&pool, &filter).await?;
    Ok(Json(LogsResponse { logs }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use crate::api::handlers::auth::AuthConfig;
    use secrecy::SecretString;
    use sqlx::postgres::PgPoolOptions;

    #[test]
    fn event_types_render_upper_snake() {
        assert_eq!(EventType::LoginFarm.as_str(), "LOGIN_FARM");
        assert_eq!(EventType::LoginFarmFailed.as_str(), "LOGIN_FARM_FAILED");
        assert_eq!(EventType::LoginFarmBlocked.as_str(), "LOGIN_FARM_BLOCKED");
        assert_eq!(EventType::LoginAdmin.as_str(), "LOGIN_ADMIN");
        assert_eq!(EventType::LoginAdminFailed.as_str(), "LOGIN_ADMIN_FAILED");
        assert_eq!(EventType::SuspendFarm.as_str(), "SUSPEND_FARM");
        assert_eq!(EventType::ReinstateFarm.as_str(), "REINSTATE_FARM");
        assert_eq!(EventType::DeactivateFarm.as_str(), "DEACTIVATE_FARM");
        assert_eq!(EventType::DeleteFarm.as_str(), "DELETE_FARM");
    }

    #[tokio::test]
    async fn record_swallows_write_failures() {
        // Unreachable database: the append must fail silently.
        let pool = PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(100))
            .connect_lazy("postgres://postgres@localhost:1/postgres")
            .expect("lazy pool");
        record(&pool, EventType::LoginFarm, "a@x.com", Some("FarmA")).await;
    }

    #[tokio::test]
    async fn list_logs_requires_admin_session() {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let state = Arc::new(AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()),
            &SecretString::from("super-secret".to_string()),
            std::sync::Arc::new(LogEmailSender),
        ));
        let result = list_logs(
            HeaderMap::new(),
            Extension(pool),
            Extension(state),
            Query(LogQuery::default()),
        )
        .await;
        assert!(result.is_err());
    }
}
