use crate::api;
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub base_url: String,
    pub session_secret: SecretString,
    pub session_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub verification_token_ttl_seconds: i64,
}

/// Execute the server action.
/// # Errors
/// Returns an error if the server fails to start.
pub async fn execute(args: Args) -> anyhow::Result<()> {
    let auth_config = api::handlers::auth::AuthConfig::new(args.base_url)
        .with_session_ttl_seconds(args.session_ttl_seconds)
        .with_reset_token_ttl_seconds(args.reset_token_ttl_seconds)
        .with_verification_token_ttl_seconds(args.verification_token_ttl_seconds);

    // Local/dev delivery logs outbound mail; swap the sender to integrate a
    // real provider without touching the handlers.
    let email_sender = Arc::new(api::email::LogEmailSender);

    api::new(
        args.port,
        args.dsn,
        &args.session_secret,
        auth_config,
        email_sender,
    )
    .await
}
