use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{self, SaltString},
};
use rand_core::OsRng;

#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// The stored digest is not a parseable PHC string.
    #[error("invalid password digest format: {0}")]
    InvalidDigestFormat(String),

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Hash a password with Argon2id and a fresh random salt.
/// Hashing the same input twice yields two different digests.
pub fn hash_password(plaintext: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();
    Ok(digest)
}

/// Check a password against a stored digest.
///
/// A wrong password is `Ok(false)`; only a malformed digest is an error.
pub fn verify_password(plaintext: &str, digest: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(digest)
        .map_err(|e| PasswordError::InvalidDigestFormat(e.to_string()))?;

    match Argon2::default().verify_password(plaintext.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::InvalidDigestFormat(e.to_string())),
    }
}
