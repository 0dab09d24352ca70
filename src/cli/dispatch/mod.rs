//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::auth;
use anyhow::{Context, Result};
use secrecy::SecretString;

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        base_url: auth_opts.base_url,
        session_secret: SecretString::from(auth_opts.session_secret),
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        reset_token_ttl_seconds: auth_opts.reset_token_ttl_seconds,
        verification_token_ttl_seconds: auth_opts.verification_token_ttl_seconds,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;
    use secrecy::ExposeSecret;

    #[test]
    fn session_secret_required() {
        temp_env::with_vars(
            [
                ("AQUALEAF_SESSION_SECRET", None::<&str>),
                (
                    "AQUALEAF_DSN",
                    Some("postgres://user@localhost:5432/aqualeaf"),
                ),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["aqualeaf"]);
                assert!(result.is_err(), "missing session secret should fail");
            },
        );
    }

    #[test]
    fn server_action_built_from_matches() {
        temp_env::with_vars([("AQUALEAF_SESSION_TTL_SECONDS", None::<&str>)], || {
            let command = crate::cli::commands::new();
            let matches = command.get_matches_from(vec![
                "aqualeaf",
                "--dsn",
                "postgres://user@localhost:5432/aqualeaf",
                "--session-secret",
                "super-secret",
                "--base-url",
                "https://farm.aqualeaf.dev",
            ]);
            let action = handler(&matches).expect("server action");
            let Action::Server(args) = action;
            assert_eq!(args.port, 8080);
            assert_eq!(args.dsn, "postgres://user@localhost:5432/aqualeaf");
            assert_eq!(args.base_url, "https://farm.aqualeaf.dev");
            assert_eq!(args.session_secret.expose_secret(), "super-secret");
            assert_eq!(args.session_ttl_seconds, 3600);
        });
    }
}
