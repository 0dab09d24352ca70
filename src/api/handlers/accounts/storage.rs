//! Database helpers for administrator-driven account management.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::types::{AccountStatus, AccountSummary};

/// Identity fields of the account a status change landed on, for the audit
/// record.
pub(super) struct AccountTarget {
    pub(super) farm_name: String,
}

pub(super) async fn list_accounts(pool: &PgPool) -> Result<Vec<AccountSummary>> {
    let query = r"
        SELECT farm_id, farm_name, email, status::text AS status
        FROM farm_accounts
        ORDER BY created_at DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to list farm accounts")?;

    rows.into_iter()
        .map(|row| {
            let status: String = row.get("status");
            let status = AccountStatus::parse(&status)
                .with_context(|| format!("unexpected account status: {status}"))?;
            let farm_id: Uuid = row.get("farm_id");
            Ok(AccountSummary {
                id: farm_id.to_string(),
                farm_name: row.get("farm_name"),
                email: row.get("email"),
                status,
            })
        })
        .collect()
}

/// Write the new status. The last write wins when two administrator actions
/// race; each still produces its own audit record.
pub(super) async fn set_account_status(
    pool: &PgPool,
    farm_id: Uuid,
    status: AccountStatus,
) -> Result<Option<AccountTarget>> {
    let query = r"
        UPDATE farm_accounts
        SET status = $2::account_status,
            last_updated = NOW()
        WHERE farm_id = $1
        RETURNING farm_name
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(farm_id)
        .bind(status.as_str())
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to update account status")?;

    Ok(row.map(|row| AccountTarget {
        farm_name: row.get("farm_name"),
    }))
}

/// Permanently erase an account, but only from `deactivated` status. Any
/// other current status matches zero rows and reads as not-found.
pub(super) async fn delete_deactivated_account(pool: &PgPool, farm_id: Uuid) -> Result<bool> {
    let query = r"
        DELETE FROM farm_accounts
        WHERE farm_id = $1 AND status = 'deactivated'
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "DELETE",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(farm_id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to delete farm account")?;

    Ok(result.rows_affected() > 0)
}
