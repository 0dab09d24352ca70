//! Database helpers for the account lifecycle flows.
//!
//! Every operation here is a single-row, single-statement atomic update; the
//! flows never need cross-account atomicity. Token columns hold SHA-256
//! digests, never raw tokens.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row};
use tracing::Instrument;
use uuid::Uuid;

use super::super::accounts::types::AccountStatus;

/// Outcome when attempting to create a new unverified farm account.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created,
    Conflict,
}

/// Outcome of a verification resend request.
#[derive(Debug)]
pub(super) enum ResendOutcome {
    Rotated,
    AlreadyVerified,
    NotFound,
}

/// Outcome of redeeming a password reset token.
#[derive(Debug)]
pub(super) enum ResetOutcome {
    Reset,
    Expired,
    NotFound,
}

/// Fields needed to evaluate a farm login attempt.
pub(super) struct FarmLoginRecord {
    pub(super) farm_id: Uuid,
    pub(super) farm_name: String,
    pub(super) email: String,
    pub(super) password_hash: String,
    pub(super) status: AccountStatus,
}

/// Fields needed to evaluate an administrator login attempt.
pub(super) struct AdminRecord {
    pub(super) admin_id: Uuid,
    pub(super) username: String,
    pub(super) email: String,
    pub(super) password_hash: String,
}

/// Look up a farm account by email or farm name. Identifiers match
/// case-insensitively while the stored values keep their original casing.
pub(super) async fn lookup_farm_account(
    pool: &PgPool,
    identifier: &str,
) -> Result<Option<FarmLoginRecord>> {
    let query = r"
        SELECT farm_id, farm_name, email, password_hash, status::text AS status
        FROM farm_accounts
        WHERE LOWER(email) = LOWER($1) OR LOWER(farm_name) = LOWER($1)
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(identifier)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup farm account")?;

    row.map(|row| {
        let status: String = row.get("status");
        let status = AccountStatus::parse(&status)
            .with_context(|| format!("unexpected account status: {status}"))?;
        Ok(FarmLoginRecord {
            farm_id: row.get("farm_id"),
            farm_name: row.get("farm_name"),
            email: row.get("email"),
            password_hash: row.get("password_hash"),
            status,
        })
    })
    .transpose()
}

/// Look up an administrator by email only.
pub(super) async fn lookup_administrator(
    pool: &PgPool,
    email: &str,
) -> Result<Option<AdminRecord>> {
    let query = r"
        SELECT admin_id, username, email, password_hash
        FROM administrators
        WHERE LOWER(email) = LOWER($1)
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup administrator")?;

    Ok(row.map(|row| AdminRecord {
        admin_id: row.get("admin_id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
    }))
}

/// Create a farm account in `unverified` status with its verification token.
///
/// The duplicate check runs immediately before the insert; the remaining
/// race window is closed by the unique indexes, which also map to `Conflict`.
pub(super) async fn create_unverified_account(
    pool: &PgPool,
    farm_name: &str,
    location: &str,
    email: &str,
    password_hash: &str,
    token_hash: &[u8],
    verification_ttl_seconds: Option<i64>,
) -> Result<SignupOutcome> {
    let query = r"
        SELECT 1
        FROM farm_accounts
        WHERE LOWER(email) = LOWER($1) OR LOWER(farm_name) = LOWER($2)
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let exists = sqlx::query(query)
        .bind(email)
        .bind(farm_name)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to check for existing account")?;

    if exists.is_some() {
        return Ok(SignupOutcome::Conflict);
    }

    let query = r"
        INSERT INTO farm_accounts
            (farm_name, location, email, password_hash, status, verification_token, verification_expires)
        VALUES ($1, $2, $3, $4, 'unverified', $5, NOW() + ($6 * INTERVAL '1 second'))
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let result = sqlx::query(query)
        .bind(farm_name)
        .bind(location)
        .bind(email)
        .bind(password_hash)
        .bind(token_hash)
        .bind(verification_ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await;

    match result {
        Ok(_) => Ok(SignupOutcome::Created),
        Err(err) if is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert farm account"),
    }
}

/// Rotate the verification token for an unverified account. The previous
/// token stops matching as soon as the new digest is written.
pub(super) async fn rotate_verification_token(
    pool: &PgPool,
    email: &str,
    token_hash: &[u8],
    verification_ttl_seconds: Option<i64>,
) -> Result<ResendOutcome> {
    let query = r"
        SELECT farm_id, status::text AS status
        FROM farm_accounts
        WHERE LOWER(email) = LOWER($1)
        LIMIT 1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account for resend")?;

    let Some(row) = row else {
        return Ok(ResendOutcome::NotFound);
    };

    let status: String = row.get("status");
    if status != AccountStatus::Unverified.as_str() {
        return Ok(ResendOutcome::AlreadyVerified);
    }

    let farm_id: Uuid = row.get("farm_id");
    let query = r"
        UPDATE farm_accounts
        SET verification_token = $2,
            verification_expires = NOW() + ($3 * INTERVAL '1 second'),
            last_updated = NOW()
        WHERE farm_id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(farm_id)
        .bind(token_hash)
        .bind(verification_ttl_seconds)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to rotate verification token")?;

    Ok(ResendOutcome::Rotated)
}

/// Consume a verification token and activate the account in one statement.
///
/// Fails closed: a token that does not match a currently-unverified account
/// (wrong token, already consumed, or expired when expiry is enabled) simply
/// matches zero rows.
pub(super) async fn consume_verification_token(pool: &PgPool, token_hash: &[u8]) -> Result<bool> {
    let query = r"
        UPDATE farm_accounts
        SET status = 'active',
            verification_token = NULL,
            verification_expires = NULL,
            last_updated = NOW()
        WHERE verification_token = $1
          AND status = 'unverified'
          AND (verification_expires IS NULL OR verification_expires > NOW())
        RETURNING farm_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;

    Ok(row.is_some())
}

/// Store a reset token + absolute expiry for the account, if it exists.
/// Overwrites any previous reset token, invalidating it.
pub(super) async fn set_reset_token(
    pool: &PgPool,
    email: &str,
    token_hash: &[u8],
    reset_ttl_seconds: i64,
) -> Result<bool> {
    let query = r"
        UPDATE farm_accounts
        SET reset_token = $2,
            reset_expires = NOW() + ($3 * INTERVAL '1 second'),
            last_updated = NOW()
        WHERE LOWER(email) = LOWER($1)
        RETURNING farm_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(token_hash)
        .bind(reset_ttl_seconds)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to set reset token")?;

    Ok(row.is_some())
}

/// Redeem a reset token: replace the credential and clear token + expiry in
/// one atomic statement. A consumed or raced token matches zero rows; a
/// follow-up existence probe distinguishes `Expired` from `NotFound` for the
/// user-facing message.
pub(super) async fn consume_reset_token(
    pool: &PgPool,
    token_hash: &[u8],
    new_password_hash: &str,
) -> Result<ResetOutcome> {
    let query = r"
        UPDATE farm_accounts
        SET password_hash = $2,
            reset_token = NULL,
            reset_expires = NULL,
            last_updated = NOW()
        WHERE reset_token = $1
          AND reset_expires IS NOT NULL
          AND reset_expires > NOW()
        RETURNING farm_id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token_hash)
        .bind(new_password_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume reset token")?;

    if row.is_some() {
        return Ok(ResetOutcome::Reset);
    }

    let query = "SELECT 1 FROM farm_accounts WHERE reset_token = $1 LIMIT 1";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query
    );
    let stale = sqlx::query(query)
        .bind(token_hash)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to probe reset token")?;

    if stale.is_some() {
        Ok(ResetOutcome::Expired)
    } else {
        Ok(ResetOutcome::NotFound)
    }
}

pub(super) fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().is_some_and(|code| code.as_ref() == "23505"),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::{FarmLoginRecord, ResendOutcome, ResetOutcome, SignupOutcome, is_unique_violation};
    use crate::api::handlers::accounts::types::AccountStatus;
    use sqlx::error::{DatabaseError, ErrorKind};
    use std::borrow::Cow;
    use std::error::Error as StdError;
    use std::fmt;
    use uuid::Uuid;

    #[test]
    fn signup_outcome_debug_names() {
        assert_eq!(format!("{:?}", SignupOutcome::Created), "Created");
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn resend_outcome_debug_names() {
        assert_eq!(format!("{:?}", ResendOutcome::Rotated), "Rotated");
        assert_eq!(
            format!("{:?}", ResendOutcome::AlreadyVerified),
            "AlreadyVerified"
        );
        assert_eq!(format!("{:?}", ResendOutcome::NotFound), "NotFound");
    }

    #[test]
    fn reset_outcome_debug_names() {
        assert_eq!(format!("{:?}", ResetOutcome::Reset), "Reset");
        assert_eq!(format!("{:?}", ResetOutcome::Expired), "Expired");
        assert_eq!(format!("{:?}", ResetOutcome::NotFound), "NotFound");
    }

    #[test]
    fn farm_login_record_holds_values() {
        let record = FarmLoginRecord {
            farm_id: Uuid::nil(),
            farm_name: "FarmA".to_string(),
            email: "a@x.com".to_string(),
            password_hash: "digest".to_string(),
            status: AccountStatus::Active,
        };
        assert_eq!(record.farm_id, Uuid::nil());
        assert_eq!(record.status, AccountStatus::Active);
    }

    #[derive(Debug)]
    struct TestDbError {
        code: Option<&'static str>,
    }

    impl fmt::Display for TestDbError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "test database error")
        }
    }

    impl StdError for TestDbError {}

    impl DatabaseError for TestDbError {
        fn message(&self) -> &'static str {
            "test database error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            self.code.map(Cow::Borrowed)
        }

        fn as_error(&self) -> &(dyn StdError + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn StdError + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn StdError + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> ErrorKind {
            ErrorKind::UniqueViolation
        }
    }

    #[test]
    fn is_unique_violation_matches_sqlstate() {
        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("23505"),
        }));
        assert!(is_unique_violation(&err));

        let err = sqlx::Error::Database(Box::new(TestDbError {
            code: Some("99999"),
        }));
        assert!(!is_unique_violation(&err));

        let err = sqlx::Error::RowNotFound;
        assert!(!is_unique_violation(&err));
    }
}
