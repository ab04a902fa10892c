//! Password hashing and verification using Argon2id.
use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Argon2, PasswordHasher, PasswordVerifier};

use super::AuthError;

/// Hash a plaintext password into a PHC string.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::PasswordHash(format!("hash error: {err}")))
}

/// Verify a plaintext password against a PHC-format hash.
///
/// Returns `Ok(false)` on mismatch and an error only when the stored hash is
/// malformed.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let parsed = argon2::PasswordHash::new(hash)
        .map_err(|err| AuthError::PasswordHash(format!("invalid hash format: {err}")))?;
    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(err) => Err(AuthError::PasswordHash(format!("verify error: {err}"))),
    }
}
