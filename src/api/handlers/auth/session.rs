//! Signed session tokens and the `token` cookie.
//!
//! Sessions are stateless bearer credentials: HS256-signed claims carrying
//! identity and role but no live account status, valid for a fixed TTL.
//! Logout is client-directed cookie expiry; there is no server-side
//! revocation list, so an issued token stays cryptographically valid until
//! it expires.

use axum::{
    extract::Extension,
    http::{
        HeaderMap, HeaderValue, StatusCode,
        header::{InvalidHeaderValue, SET_COOKIE},
    },
    response::IntoResponse,
};
use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use super::state::{AuthConfig, AuthState};
use crate::api::error::ApiError;

pub(crate) const SESSION_COOKIE_NAME: &str = "token";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum SessionRole {
    Farm,
    Admin,
}

/// Identity assertion embedded in the signed bearer token.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub(crate) struct SessionClaims {
    pub(crate) sub: String,
    pub(crate) name: String,
    pub(crate) email: String,
    pub(crate) role: SessionRole,
    pub(crate) iat: i64,
    pub(crate) exp: i64,
}

impl SessionClaims {
    pub(crate) fn farm(farm_id: Uuid, farm_name: &str, email: &str, ttl_seconds: i64) -> Self {
        Self::new(farm_id, farm_name, email, SessionRole::Farm, ttl_seconds)
    }

    pub(crate) fn admin(admin_id: Uuid, username: &str, email: &str, ttl_seconds: i64) -> Self {
        Self::new(admin_id, username, email, SessionRole::Admin, ttl_seconds)
    }

    fn new(id: Uuid, name: &str, email: &str, role: SessionRole, ttl_seconds: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: id.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role,
            iat: now,
            exp: now + ttl_seconds,
        }
    }
}

/// Process-wide signing keys, loaded once at startup.
pub(crate) struct SessionKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl SessionKeys {
    pub(crate) fn new(secret: &SecretString) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
        }
    }

    /// Sign the claims into a bearer token.
    pub(crate) fn issue(&self, claims: &SessionClaims) -> anyhow::Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding)
            .map_err(|err| anyhow::anyhow!("failed to sign session token: {err}"))
    }

    /// Decode and validate a bearer token. Malformed, mis-signed, and expired
    /// tokens are all rejected uniformly as `None`.
    pub(crate) fn verify(&self, token: &str) -> Option<SessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<SessionClaims>(token, &self.decoding, &validation)
            .map(|data| data.claims)
            .ok()
    }
}

#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    responses(
        (status = 204, description = "Session cookie cleared")
    ),
    tag = "auth"
)]
pub async fn logout(auth_state: Extension<Arc<AuthState>>) -> impl IntoResponse {
    // Sessions are stateless; clearing the cookie is all logout does. The
    // token itself remains valid until its natural expiry.
    let mut response_headers = HeaderMap::new();
    if let Ok(cookie) = clear_session_cookie(auth_state.config()) {
        response_headers.insert(SET_COOKIE, cookie);
    }
    (StatusCode::NO_CONTENT, response_headers)
}

/// Build the HTTP-only cookie carrying the session token.
pub(crate) fn session_cookie(
    config: &AuthConfig,
    token: &str,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let ttl_seconds = config.session_ttl_seconds();
    let mut cookie = format!(
        "{SESSION_COOKIE_NAME}={token}; Path=/; HttpOnly; SameSite=Lax; Max-Age={ttl_seconds}"
    );
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn clear_session_cookie(
    config: &AuthConfig,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!("{SESSION_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0");
    if config.session_cookie_secure() {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub(crate) fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    let header = headers.get(axum::http::header::COOKIE)?;
    let value = header.to_str().ok()?;
    for pair in value.split(';') {
        let trimmed = pair.trim();
        let mut parts = trimmed.splitn(2, '=');
        let key = parts.next()?.trim();
        let val = parts.next()?.trim();
        if key == SESSION_COOKIE_NAME {
            return Some(val.to_string());
        }
    }
    None
}

/// Resolve the session cookie into administrator claims.
///
/// Missing, malformed, mis-signed, expired, and non-admin tokens are all
/// rejected the same way so the caller learns nothing beyond
/// "unauthenticated".
pub(crate) fn require_admin(
    headers: &HeaderMap,
    state: &AuthState,
) -> Result<SessionClaims, ApiError> {
    let token = extract_session_token(headers).ok_or(ApiError::Unauthorized)?;
    let claims = state
        .session_keys()
        .verify(&token)
        .ok_or(ApiError::Unauthorized)?;
    if claims.role != SessionRole::Admin {
        return Err(ApiError::Unauthorized);
    }
    Ok(claims)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::email::LogEmailSender;
    use axum::http::header::COOKIE;

    fn keys() -> SessionKeys {
        SessionKeys::new(&SecretString::from("super-secret".to_string()))
    }

    fn state() -> AuthState {
        AuthState::new(
            AuthConfig::new("http://localhost:3000".to_string()),
            &SecretString::from("super-secret".to_string()),
            Arc::new(LogEmailSender),
        )
    }

    #[test]
    fn issue_and_verify_round_trip() {
        let keys = keys();
        let claims = SessionClaims::farm(Uuid::nil(), "FarmA", "a@x.com", 3600);
        let token = keys.issue(&claims).expect("token");
        let decoded = keys.verify(&token).expect("claims");
        assert_eq!(decoded.sub, Uuid::nil().to_string());
        assert_eq!(decoded.name, "FarmA");
        assert_eq!(decoded.email, "a@x.com");
        assert_eq!(decoded.role, SessionRole::Farm);
        assert_eq!(decoded.exp - decoded.iat, 3600);
    }

    #[test]
    fn expired_token_rejected() {
        let keys = keys();
        // Expired well beyond the default validation leeway.
        let claims = SessionClaims::farm(Uuid::nil(), "FarmA", "a@x.com", -600);
        let token = keys.issue(&claims).expect("token");
        assert!(keys.verify(&token).is_none());
    }

    #[test]
    fn foreign_signature_rejected() {
        let keys = keys();
        let other = SessionKeys::new(&SecretString::from("other-secret".to_string()));
        let claims = SessionClaims::admin(Uuid::nil(), "ops", "ops@aqualeaf.dev", 3600);
        let token = other.issue(&claims).expect("token");
        assert!(keys.verify(&token).is_none());
        assert!(keys.verify("not-a-token").is_none());
    }

    #[test]
    fn session_cookie_shape() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        let cookie = session_cookie(&config, "abc").expect("cookie");
        assert_eq!(
            cookie.to_str().ok(),
            Some("token=abc; Path=/; HttpOnly; SameSite=Lax; Max-Age=3600")
        );

        let secure = AuthConfig::new("https://farm.aqualeaf.dev".to_string());
        let cookie = session_cookie(&secure, "abc").expect("cookie");
        assert!(cookie.to_str().is_ok_and(|value| value.ends_with("; Secure")));
    }

    #[test]
    fn clear_cookie_zeroes_max_age() {
        let config = AuthConfig::new("http://localhost:3000".to_string());
        let cookie = clear_session_cookie(&config).expect("cookie");
        assert_eq!(
            cookie.to_str().ok(),
            Some("token=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
        );
    }

    #[test]
    fn extract_session_token_from_cookie_header() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; token=abc123; other=1"),
        );
        assert_eq!(extract_session_token(&headers), Some("abc123".to_string()));

        let empty = HeaderMap::new();
        assert_eq!(extract_session_token(&empty), None);
    }

    #[test]
    fn require_admin_accepts_only_admin_sessions() {
        let state = state();
        let mut headers = HeaderMap::new();
        assert!(require_admin(&headers, &state).is_err());

        let farm_claims = SessionClaims::farm(Uuid::nil(), "FarmA", "a@x.com", 3600);
        let farm_token = state.session_keys().issue(&farm_claims).expect("token");
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("token={farm_token}")).expect("header"),
        );
        assert!(require_admin(&headers, &state).is_err());

        let admin_claims = SessionClaims::admin(Uuid::nil(), "ops", "ops@aqualeaf.dev", 3600);
        let admin_token = state.session_keys().issue(&admin_claims).expect("token");
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("token={admin_token}")).expect("header"),
        );
        let claims = require_admin(&headers, &state).expect("admin claims");
        assert_eq!(claims.email, "ops@aqualeaf.dev");
    }

    #[tokio::test]
    async fn logout_clears_cookie() {
        let response = logout(Extension(Arc::new(state()))).await.into_response();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let set_cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default();
        assert!(set_cookie.contains("Max-Age=0"));
    }
}
