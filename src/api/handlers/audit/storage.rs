//! Database helpers for the audit trail.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;

use super::{AuditLogEntry, LogQuery};

pub(super) async fn insert_event(
    pool: &PgPool,
    event_type: &str,
    actor: &str,
    target: Option<&str>,
) -> Result<()> {
    let query = r"
        INSERT INTO system_logs (event_type, actor_email, target_farm)
        VALUES ($1, $2, $3)
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    sqlx::query(query)
        .bind(event_type)
        .bind(actor)
        .bind(target)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to insert audit record")?;
    Ok(())
}

/// Fetch audit records newest first. Same-timestamp ties keep arrival order
/// via the serial row id. All filters bind as parameters of one statement.
pub(super) async fn fetch_events(pool: &PgPool, filter: &LogQuery) -> Result<Vec<AuditLogEntry>> {
    let query = r"
        SELECT log_id, event_type, actor_email, target_farm, created_at
        FROM system_logs
        WHERE ($1::text IS NULL OR event_type = $1)
          AND ($2::text IS NULL OR actor_email ILIKE '%' || $2 || '%')
          AND ($3::text IS NULL OR target_farm ILIKE '%' || $3 || '%')
          AND ($4::timestamptz IS NULL OR created_at >= $4)
          AND ($5::timestamptz IS NULL OR created_at <= $5)
        ORDER BY created_at DESC, log_id DESC
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let rows = sqlx::query(query)
        .bind(filter.event_type.as_deref())
        .bind(filter.actor_email.as_deref())
        .bind(filter.target_farm.as_deref())
        .bind(filter.start_date)
        .bind(filter.end_date)
        .fetch_all(pool)
        .instrument(span)
        .await
        .context("failed to fetch audit records")?;

    Ok(rows
        .into_iter()
        .map(|row| AuditLogEntry {
            log_id: row.get("log_id"),
            event_type: row.get("event_type"),
            actor_email: row.get("actor_email"),
            target_farm: row.get("target_farm"),
            timestamp: row.get("created_at"),
        })
        .collect())
}
