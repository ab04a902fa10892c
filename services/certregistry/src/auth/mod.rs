//! Admin authentication.
//!
//! # Purpose
//! Groups Argon2 password verification, HS256 session tokens, the bearer guard
//! used by protected handlers, and the login/session endpoints.
use thiserror::Error;

pub mod login;
pub mod password;
pub mod session;
pub mod token;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("missing bearer token")]
    MissingToken,
    #[error("password hash error: {0}")]
    PasswordHash(String),
    #[error(transparent)]
    Token(#[from] token::TokenError),
}
