//! Admin session tokens.
//!
//! # Purpose
//! Mints and verifies the HS256 JWTs handed out by `POST /v1/auth/login`.
//!
//! # Security
//! - The algorithm is pinned to HS256 and the issuer is checked on decode.
//! - Secrets shorter than 32 bytes are rejected.
//! - Never log minted tokens.
use crate::model::{AdminRole, AdminUser};
use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

pub const SESSION_ISSUER: &str = "certregistry";
pub const MIN_SECRET_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("jwt error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
    #[error("session expired")]
    Expired,
    #[error("key error: {0}")]
    Key(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionClaims {
    pub iss: String,
    /// Admin user id.
    pub sub: String,
    pub email: String,
    pub name: String,
    pub role: AdminRole,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_in: u64,
    pub claims: SessionClaims,
}

#[derive(Clone)]
pub struct SessionSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl SessionSigner {
    pub fn from_secret(secret: &[u8], ttl: Duration) -> Result<Self, TokenError> {
        if secret.len() < MIN_SECRET_BYTES {
            return Err(TokenError::Key(format!(
                "session secret must be at least {MIN_SECRET_BYTES} bytes"
            )));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            ttl,
        })
    }

    /// Signer with a process-local random secret. Sessions do not survive a
    /// restart.
    pub fn ephemeral(ttl: Duration) -> Self {
        let mut secret = [0u8; MIN_SECRET_BYTES];
        rand::thread_rng().fill_bytes(&mut secret);
        Self {
            encoding: EncodingKey::from_secret(&secret),
            decoding: DecodingKey::from_secret(&secret),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn mint(&self, admin: &AdminUser) -> Result<IssuedToken, TokenError> {
        let now = Utc::now().timestamp();
        let claims = SessionClaims {
            iss: SESSION_ISSUER.to_string(),
            sub: admin.id.to_string(),
            email: admin.email.clone(),
            name: admin.name.clone(),
            role: admin.role,
            iat: now,
            exp: now + self.ttl.as_secs() as i64,
        };
        let token = jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(IssuedToken {
            token,
            expires_in: self.ttl.as_secs(),
            claims,
        })
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[SESSION_ISSUER]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);
        validation.leeway = 0;
        match jsonwebtoken::decode::<SessionClaims>(token, &self.decoding, &validation) {
            Ok(data) => Ok(data.claims),
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                Err(TokenError::Expired)
            }
            Err(err) => Err(TokenError::Jwt(err)),
        }
    }
}
