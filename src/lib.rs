//! # AquaLeaf Identity Service
//!
//! `aqualeaf` is the account lifecycle and credential management authority for
//! the AquaLeaf farm-monitoring platform. It owns the account status state
//! machine, the token flows for email verification and password recovery,
//! session issuance, and the append-only audit trail.
//!
//! ## Account model
//!
//! Two principal classes share the surface:
//!
//! - **Farm accounts** self-register and start `unverified`. Consuming the
//!   emailed verification token moves them to `active`; administrators may
//!   suspend, reinstate, or deactivate them, and permanently erase accounts
//!   that are already `deactivated`.
//! - **Administrators** are pre-provisioned and carry no status; matching
//!   credentials are sufficient to sign in.
//!
//! ## Status gate
//!
//! An account is in exactly one status at a time. `unverified` accounts never
//! authenticate regardless of credential correctness; `suspended` and
//! `deactivated` accounts fail login with distinct user-facing reasons. The
//! handler layer is the sole writer of account status.
//!
//! ## Sessions & audit
//!
//! Sessions are stateless signed bearer tokens (1 hour) carried in an
//! HTTP-only cookie; claims carry identity and role but no live status, so an
//! already-issued session outlives a later suspension until natural expiry.
//! Every security-relevant transition and authentication attempt appends a
//! `system_logs` row; audit writes are best-effort and never roll back the
//! transition they document.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }

    #[test]
    fn test_app_user_agent_format() {
        assert!(APP_USER_AGENT.starts_with(env!("CARGO_PKG_NAME")));
        assert!(APP_USER_AGENT.contains(env!("CARGO_PKG_VERSION")));
    }
}
