//! API handlers and shared utilities for the AquaLeaf identity service.

pub mod accounts;
pub mod audit;
pub mod auth;
pub mod health;
pub mod root;

use regex::Regex;

/// Lightweight email sanity check used by auth handlers before persisting data.
#[must_use]
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}
