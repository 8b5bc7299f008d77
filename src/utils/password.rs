use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::error::{AppError, AppResult};

/// Generates a fresh random salt in the B64 form argon2 expects.
pub fn generate_salt() -> String {
    SaltString::generate(&mut OsRng).as_str().to_string()
}

/// Hashes `password` with the given salt into a PHC string.
pub fn hash(password: &str, salt: &str) -> AppResult<String> {
    let salt = SaltString::from_b64(salt)
        .map_err(|e| AppError::Internal(format!("Invalid password salt: {}", e)))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored digest. The digest must have been produced
/// with `salt`; a digest that does not parse never verifies.
pub fn verify(password: &str, digest: &str, salt: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(digest) else {
        return false;
    };

    if parsed.salt.map(|s| s.as_str()) != Some(salt) {
        return false;
    }

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
