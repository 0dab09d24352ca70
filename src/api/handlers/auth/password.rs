//! One-way password hashing and verification.
//!
//! Digests are Argon2id PHC strings with a per-call random salt embedded in
//! the output. Verification is constant-time through the `argon2` crate and
//! treats malformed digests as a mismatch rather than an error.

use anyhow::{Result, anyhow};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use rand::rngs::OsRng;

/// Hash a password for storage. Each call salts independently, so equal
/// passwords produce different digests.
pub(crate) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!("failed to hash password: {err}"))?
        .to_string();
    Ok(digest)
}

/// Verify a password against a stored digest. Returns false for mismatches
/// and for digests that fail to parse.
pub(crate) fn verify_password(password: &str, digest: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
