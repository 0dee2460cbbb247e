//! Password hashing and signed session tokens.
//!
//! Sessions are stateless: a token is `{user_id}.{expires_unix}.{signature}`
//! where the signature is HMAC-SHA256 over the first two parts. The token
//! travels in the `wp_session` cookie or an `Authorization: Bearer` header.

use crate::config::SessionConfig;
use crate::error::{AppError, AppResult};
use crate::AppState;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts, HeaderMap};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "wp_session";

type HmacSha256 = Hmac<Sha256>;

/// Hash a password with Argon2 on the blocking pool
pub async fn hash_password(password: &str) -> AppResult<String> {
    let password = password.to_owned();
    tokio::task::spawn_blocking(move || {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AppError::Message(format!("Failed to hash password: {}", e)))
    })
    .await
    .map_err(|e| AppError::Message(format!("Password hashing task failed: {}", e)))?
}

/// Verify a password against a stored Argon2 hash. Malformed hashes never verify.
pub async fn verify_password(password: &str, stored_hash: &str) -> bool {
    let password = password.to_owned();
    let stored_hash = stored_hash.to_owned();
    tokio::task::spawn_blocking(move || {
        PasswordHash::new(&stored_hash)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    })
    .await
    .unwrap_or(false)
}

/// Verified contents of a session token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionClaims {
    pub user_id: Uuid,
    pub expires_at: i64,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct SessionSigner {
    secret: Vec<u8>,
    ttl: chrono::Duration,
    cookie_secure: bool,
}

impl SessionSigner {
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            secret: config.secret.as_bytes().to_vec(),
            ttl: config.ttl(),
            cookie_secure: config.cookie_secure,
        }
    }

    fn signature(&self, payload: &str) -> AppResult<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| AppError::Config(format!("Invalid session secret: {}", e)))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }

    /// Issue a token for `user_id` valid from `now` for the configured TTL
    pub fn issue_at(&self, user_id: Uuid, now: i64) -> AppResult<String> {
        let expires_at = now + self.ttl.num_seconds();
        let payload = format!("{}.{}", user_id, expires_at);
        let mac = self.signature(&payload)?;
        Ok(format!(
            "{}.{}",
            payload,
            hex::encode(mac.finalize().into_bytes())
        ))
    }

    pub fn issue(&self, user_id: Uuid) -> AppResult<String> {
        self.issue_at(user_id, chrono::Utc::now().timestamp())
    }

    /// Check signature and expiry as of `now`
    pub fn verify_at(&self, token: &str, now: i64) -> AppResult<SessionClaims> {
        let invalid = || {
            debug!("Rejected malformed or tampered session token");
            unauthorized()
        };

        let mut parts = token.splitn(3, '.');
        let (user_part, expiry_part, signature_part) =
            match (parts.next(), parts.next(), parts.next()) {
                (Some(u), Some(e), Some(s)) => (u, e, s),
                _ => return Err(invalid()),
            };

        let signature = hex::decode(signature_part).map_err(|_| invalid())?;
        let payload = format!("{}.{}", user_part, expiry_part);
        self.signature(&payload)?
            .verify_slice(&signature)
            .map_err(|_| invalid())?;

        let user_id = Uuid::parse_str(user_part).map_err(|_| invalid())?;
        let expires_at: i64 = expiry_part.parse().map_err(|_| invalid())?;
        if expires_at <= now {
            debug!("Rejected session for {} expired at {}", user_id, expires_at);
            return Err(unauthorized());
        }

        Ok(SessionClaims {
            user_id,
            expires_at,
        })
    }

    pub fn verify(&self, token: &str) -> AppResult<SessionClaims> {
        self.verify_at(token, chrono::Utc::now().timestamp())
    }

    /// `Set-Cookie` value carrying `token`
    pub fn session_cookie(&self, token: &str) -> String {
        self.cookie(token, self.ttl.num_seconds())
    }

    /// `Set-Cookie` value that removes the session cookie
    pub fn clear_cookie(&self) -> String {
        self.cookie("", 0)
    }

    fn cookie(&self, value: &str, max_age: i64) -> String {
        let mut cookie = format!(
            "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
            SESSION_COOKIE, value, max_age
        );
        if self.cookie_secure {
            cookie.push_str("; Secure");
        }
        cookie
    }
}

/// Every session failure looks the same to the client
fn unauthorized() -> AppError {
    AppError::Unauthorized("Unauthorized".to_string())
}

/// Pull the session token from the bearer header first, then the cookie
pub fn extract_session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                let token = token.trim();
                if !token.is_empty() {
                    return Some(token.to_string());
                }
            }
        }
    }

    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_string())
}

/// The authenticated caller. Rejects with 401 when no valid session is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
}

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let token = extract_session_token(&parts.headers)
            .ok_or_else(unauthorized)?;
        let claims = state.sessions.verify(&token)?;
        Ok(CurrentUser { id: claims.user_id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn signer() -> SessionSigner {
        SessionSigner::new(&SessionConfig {
            secret: "test-secret-that-is-long-enough-for-hmac".into(),
            ttl_hours: 1,
            cookie_secure: true,
        })
    }

    #[test]
    fn issued_token_verifies() {
        let signer = signer();
        let user_id = Uuid::new_v4();
        let token = signer.issue_at(user_id, 1_000).unwrap();
        let claims = signer.verify_at(&token, 1_001).unwrap();
        assert_eq!(claims.user_id, user_id);
        assert_eq!(claims.expires_at, 1_000 + 3_600);
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer();
        let token = signer.issue_at(Uuid::new_v4(), 1_000).unwrap();
        tokio_test::assert_ok!(signer.verify_at(&token, 1_000 + 3_599));
        let err = tokio_test::assert_err!(signer.verify_at(&token, 1_000 + 3_600));
        assert_eq!(err.status_code(), 401);
    }

    #[test]
    fn session_failures_share_one_message() {
        let signer = signer();
        let token = signer.issue_at(Uuid::new_v4(), 1_000).unwrap();
        let failures = [
            signer.verify_at(&token, 1_000 + 3_600),
            signer.verify_at("garbage", 1_001),
            signer.verify_at(&token.replace('.', ".0"), 1_001),
        ];
        for failure in failures {
            match failure {
                Err(AppError::Unauthorized(message)) => assert_eq!(message, "Unauthorized"),
                other => panic!("expected unauthorized, got {:?}", other),
            }
        }
    }

    #[test]
    fn tampered_token_is_rejected() {
        let signer = signer();
        let token = signer.issue_at(Uuid::new_v4(), 1_000).unwrap();
        let forged = format!("{}{}", Uuid::new_v4(), &token[36..]);
        assert!(signer.verify_at(&forged, 1_001).is_err());
        assert!(signer.verify_at("garbage", 1_001).is_err());

        let other = SessionSigner::new(&SessionConfig {
            secret: "a-different-secret-entirely-0123456789".into(),
            ttl_hours: 1,
            cookie_secure: false,
        });
        assert!(other.verify_at(&token, 1_001).is_err());
    }

    #[test]
    fn token_read_from_cookie_or_bearer() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; wp_session=abc.def.123"),
        );
        assert_eq!(extract_session_token(&headers).as_deref(), Some("abc.def.123"));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer xyz"));
        assert_eq!(extract_session_token(&headers).as_deref(), Some("xyz"));

        assert_eq!(extract_session_token(&HeaderMap::new()), None);
    }

    #[test]
    fn cookies_carry_flags() {
        let signer = signer();
        let cookie = signer.session_cookie("tok");
        assert!(cookie.starts_with("wp_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(cookie.ends_with("; Secure"));
        assert!(signer.clear_cookie().contains("Max-Age=0"));
    }

    #[tokio::test]
    async fn password_hash_round_trip() {
        let hash = hash_password("correct horse").await.unwrap();
        assert!(verify_password("correct horse", &hash).await);
        assert!(!verify_password("wrong horse", &hash).await);
        assert!(!verify_password("anything", "not-a-hash").await);
    }
}
