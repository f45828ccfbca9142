//! Admin access-key verification and session tokens.
//!
//! The dashboard authenticates with a single shared access key, exchanged
//! for a short-lived HS256 session token carried in an HttpOnly cookie.

use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

pub const ADMIN_SESSION_COOKIE: &str = "admin_session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminSessionClaims {
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Clone)]
pub struct AdminAuthService {
    access_key: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_hours: i64,
}

impl AdminAuthService {
    pub fn new(access_key: &str, secret: &str, session_hours: i64) -> Self {
        Self {
            access_key: access_key.to_string(),
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            session_hours,
        }
    }

    /// Constant-time comparison so the key cannot be probed byte by byte.
    pub fn verify_access_key(&self, candidate: &str) -> bool {
        candidate
            .as_bytes()
            .ct_eq(self.access_key.as_bytes())
            .into()
    }

    pub fn create_session_token(&self) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let claims = AdminSessionClaims {
            is_admin: true,
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.session_hours)).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode admin session token: {}", e))
    }

    pub fn verify_session_token(&self, token: &str) -> Option<AdminSessionClaims> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<AdminSessionClaims>(token, &self.decoding_key, &validation) {
            Ok(data) if data.claims.is_admin => Some(data.claims),
            _ => None,
        }
    }

    pub fn session_hours(&self) -> i64 {
        self.session_hours
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> AdminAuthService {
        AdminAuthService::new("access-key", "a-test-secret-of-decent-length-123456", 24)
    }

    #[test]
    fn access_key_must_match_exactly() {
        let auth = service();
        assert!(auth.verify_access_key("access-key"));
        assert!(!auth.verify_access_key("access-key2"));
        assert!(!auth.verify_access_key(""));
    }

    #[test]
    fn session_token_round_trips() {
        let auth = service();
        let token = auth.create_session_token().unwrap();
        let claims = auth.verify_session_token(&token).expect("valid token");
        assert!(claims.is_admin);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_signed_with_other_secret_is_rejected() {
        let auth = service();
        let other = AdminAuthService::new("access-key", "a-different-secret-0987654321-abcdef", 24);
        let token = other.create_session_token().unwrap();
        assert!(auth.verify_session_token(&token).is_none());
    }

    #[test]
    fn garbage_token_is_rejected() {
        assert!(service().verify_session_token("not-a-jwt").is_none());
    }
}
