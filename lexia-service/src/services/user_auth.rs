//! Verification of end-user identity tokens.
//!
//! User tokens are minted by the external identity provider; this service
//! only verifies the HS256 signature and reads the subject. Invalid or
//! absent tokens degrade to anonymous rather than erroring.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};

pub const USER_TOKEN_COOKIE: &str = "token";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id.
    pub sub: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    pub exp: i64,
}

#[derive(Clone)]
pub struct UserTokenVerifier {
    decoding_key: DecodingKey,
}

impl UserTokenVerifier {
    pub fn new(secret: &str) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    pub fn verify(&self, token: &str) -> Option<UserClaims> {
        let validation = Validation::new(Algorithm::HS256);
        match decode::<UserClaims>(token, &self.decoding_key, &validation) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                tracing::debug!(error = %e, "Rejected user token, treating caller as anonymous");
                None
            }
        }
    }
}
