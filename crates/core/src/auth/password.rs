//! Password storage.
//!
//! Passwords are stored as Argon2id PHC strings with a per-password random
//! salt. Only the PHC string reaches the database.

use argon2::{
    Argon2, PasswordHash,
    password_hash::{self, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Password hashing failures. A wrong password is not an error.
#[derive(Debug, Error)]
pub enum PasswordError {
    /// Argon2 could not produce a hash.
    #[error("password hashing failed: {0}")]
    Hash(password_hash::Error),

    /// The stored value is not a PHC string.
    #[error("stored password hash is malformed")]
    MalformedHash,

    /// Argon2 failed for a reason other than a mismatch.
    #[error("password verification failed: {0}")]
    Verify(password_hash::Error),
}

/// Hashes a new password.
///
/// # Errors
///
/// Returns `PasswordError::Hash` if Argon2 fails.
///
/// ```
/// use spendwise_core::auth::hash_password;
///
/// let stored = hash_password("hunter22").unwrap();
/// assert!(stored.starts_with("$argon2id$"));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(PasswordError::Hash)
}

/// Checks a login attempt against a stored hash; `Ok(false)` on mismatch.
///
/// # Errors
///
/// Returns `PasswordError::MalformedHash` for a corrupt stored value.
pub fn verify_password(password: &str, stored: &str) -> Result<bool, PasswordError> {
    let stored = PasswordHash::new(stored).map_err(|_| PasswordError::MalformedHash)?;

    match Argon2::default().verify_password(password.as_bytes(), &stored) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Verify(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("secret123", "secret123", true)]
    #[case("secret123", "secret124", false)]
    #[case("secret123", "Secret123", false)]
    #[case("p@ss wörd", "p@ss wörd", true)]
    fn test_verify(#[case] stored: &str, #[case] attempt: &str, #[case] expected: bool) {
        let hash = hash_password(stored).unwrap();
        assert_eq!(verify_password(attempt, &hash).unwrap(), expected);
    }

    #[test]
    fn test_salt_makes_hashes_unique() {
        assert_ne!(
            hash_password("same-password").unwrap(),
            hash_password("same-password").unwrap()
        );
    }

    #[test]
    fn test_corrupt_stored_hash() {
        assert!(matches!(
            verify_password("secret123", "$2b$12$not-argon"),
            Err(PasswordError::MalformedHash)
        ));
    }
}
