use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;
use std::sync::OnceLock;

use crate::utils::error::AppError;

static DUMMY_HASH: OnceLock<String> = OnceLock::new();

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AppError::InternalServerError(format!("Failed to hash password: {err}")))
}

/// A stored hash that cannot be parsed counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            tracing::warn!(error = %err, "Stored password hash is unreadable");
            false
        }
    }
}

/// Hash of a throwaway password with the default parameters. Login checks
/// against it when the email is unknown so that path costs one argon2 verify
/// like a wrong password does.
pub fn dummy_hash() -> &'static str {
    DUMMY_HASH.get_or_init(|| {
        hash_password("eventflow-placeholder-password").unwrap_or_else(|err| {
            tracing::error!(error = %err, "Failed to build placeholder password hash");
            String::new()
        })
    })
}
