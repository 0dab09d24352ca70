use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};

/// Auth/session settings parsed from CLI matches.
pub struct Options {
    pub base_url: String,
    pub session_secret: String,
    pub session_ttl_seconds: i64,
    pub reset_token_ttl_seconds: i64,
    pub verification_token_ttl_seconds: i64,
}

impl Options {
    /// Collect auth options from validated matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        Ok(Self {
            base_url: matches
                .get_one::<String>("base-url")
                .cloned()
                .context("missing required argument: --base-url")?,
            session_secret: matches
                .get_one::<String>("session-secret")
                .cloned()
                .context("missing required argument: --session-secret")?,
            session_ttl_seconds: matches
                .get_one::<i64>("session-ttl-seconds")
                .copied()
                .unwrap_or(3600),
            reset_token_ttl_seconds: matches
                .get_one::<i64>("reset-token-ttl-seconds")
                .copied()
                .unwrap_or(3600),
            verification_token_ttl_seconds: matches
                .get_one::<i64>("verification-token-ttl-seconds")
                .copied()
                .unwrap_or(0),
        })
    }
}

pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new("base-url")
                .long("base-url")
                .help("Platform base URL used for verification and reset links")
                .env("AQUALEAF_BASE_URL")
                .default_value("http://localhost:3000"),
        )
        .arg(
            Arg::new("session-secret")
                .long("session-secret")
                .help("Secret used to sign session tokens")
                .env("AQUALEAF_SESSION_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new("session-ttl-seconds")
                .long("session-ttl-seconds")
                .help("Session token and cookie TTL in seconds")
                .env("AQUALEAF_SESSION_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("reset-token-ttl-seconds")
                .long("reset-token-ttl-seconds")
                .help("Password reset token TTL in seconds")
                .env("AQUALEAF_RESET_TOKEN_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new("verification-token-ttl-seconds")
                .long("verification-token-ttl-seconds")
                .help("Email verification token TTL in seconds (0 = tokens never expire)")
                .env("AQUALEAF_VERIFICATION_TOKEN_TTL_SECONDS")
                .default_value("0")
                .value_parser(clap::value_parser!(i64)),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        with_args(Command::new("aqualeaf"))
    }

    #[test]
    fn defaults_applied() {
        temp_env::with_vars(
            [
                ("AQUALEAF_BASE_URL", None::<&str>),
                ("AQUALEAF_SESSION_SECRET", None::<&str>),
                ("AQUALEAF_SESSION_TTL_SECONDS", None::<&str>),
                ("AQUALEAF_RESET_TOKEN_TTL_SECONDS", None::<&str>),
                ("AQUALEAF_VERIFICATION_TOKEN_TTL_SECONDS", None::<&str>),
            ],
            || {
                let matches = command()
                    .get_matches_from(vec!["aqualeaf", "--session-secret", "super-secret"]);
                let options = Options::parse(&matches).expect("options");
                assert_eq!(options.base_url, "http://localhost:3000");
                assert_eq!(options.session_ttl_seconds, 3600);
                assert_eq!(options.reset_token_ttl_seconds, 3600);
                assert_eq!(options.verification_token_ttl_seconds, 0);
            },
        );
    }

    #[test]
    fn overrides_applied() {
        let matches = command().get_matches_from(vec![
            "aqualeaf",
            "--base-url",
            "https://farm.aqualeaf.dev",
            "--session-secret",
            "super-secret",
            "--session-ttl-seconds",
            "1800",
            "--reset-token-ttl-seconds",
            "900",
            "--verification-token-ttl-seconds",
            "86400",
        ]);
        let options = Options::parse(&matches).expect("options");
        assert_eq!(options.base_url, "https://farm.aqualeaf.dev");
        assert_eq!(options.session_secret, "super-secret");
        assert_eq!(options.session_ttl_seconds, 1800);
        assert_eq!(options.reset_token_ttl_seconds, 900);
        assert_eq!(options.verification_token_ttl_seconds, 86400);
    }
}
