use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::SessionConfig;

/// Issues and decodes bearer session tokens (HS256 JWTs).
///
/// Decoding only proves the token was minted here and has not expired;
/// revocation and account status are checked by the access gate.
#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_minutes: i64,
}

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (identity ID)
    pub sub: Uuid,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Session ID, the revocation key
    pub jti: String,
}

impl SessionClaims {
    /// Seconds until expiry, floored at zero.
    pub fn remaining_seconds(&self) -> i64 {
        (self.exp - Utc::now().timestamp()).max(0)
    }
}

/// A freshly minted session.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

impl SessionService {
    pub fn new(config: &SessionConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            expiry_minutes: config.expiry_minutes,
        }
    }

    /// Mint a new session for an identity. Each call yields a distinct session.
    pub fn issue(&self, identity_id: Uuid) -> Result<IssuedSession, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.expiry_minutes);

        let claims = SessionClaims {
            sub: identity_id,
            exp: exp.timestamp(),
            iat: now.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode session token: {}", e))?;

        Ok(IssuedSession { token, claims })
    }

    /// Validate signature and expiry, returning the claims.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let token_data = decode::<SessionClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid session token: {}", e))?;

        Ok(token_data.claims)
    }
}
