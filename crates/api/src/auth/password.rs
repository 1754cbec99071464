//! Argon2id password hashing, verification, and strength validation.
//!
//! Hashes use Argon2id with the library's default cost parameters and a
//! random salt from [`OsRng`]. The PHC string format embeds algorithm,
//! parameters and salt in the stored hash.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use urlist_core::error::CoreError;

/// Minimum accepted password length, in characters.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Hash a plaintext password using Argon2id with a random salt.
pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// Validate a newly chosen password, then hash it.
pub fn hash_new_password(password: &str) -> Result<String, CoreError> {
    validate_password_strength(password, MIN_PASSWORD_LENGTH)?;
    hash_password(password).map_err(|e| CoreError::Internal(format!("Password hashing failed: {e}")))
}

/// Check `password` against a stored PHC hash.
///
/// A mismatch and an unparseable hash both return `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        tracing::warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Reject passwords shorter than `min_length` characters.
pub fn validate_password_strength(password: &str, min_length: usize) -> Result<(), CoreError> {
    if password.chars().count() < min_length {
        return Err(CoreError::Validation(format!(
            "Password must be at least {min_length} characters long"
        )));
    }
    Ok(())
}
