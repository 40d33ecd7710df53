//! Password hashing capability.
//!
//! # Responsibility
//! - Turn plaintext passwords into one-way, verify-capable hash strings.
//! - Keep the hashing algorithm behind a trait so callers can inject it.
//!
//! # Invariants
//! - Plaintext never leaves this module in any form other than the hash.
//! - Hash output is a self-describing PHC string (algorithm, params, salt).

use argon2::password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString};
use argon2::Argon2;
use rand::rngs::OsRng;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Hashing backend failure. Never carries plaintext.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHashError(String);

impl PasswordHashError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl Display for PasswordHashError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "password hashing failed: {}", self.0)
    }
}

impl Error for PasswordHashError {}

/// One-way password hashing capability.
pub trait PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError>;
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordHashError>;
}

impl<T: PasswordHasher + ?Sized> PasswordHasher for &T {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        (**self).hash(plaintext)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordHashError> {
        (**self).verify(plaintext, hash)
    }
}

/// Argon2id hasher with a fresh random salt per hash.
#[derive(Default)]
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PasswordHasher for Argon2PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, PasswordHashError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(plaintext.as_bytes(), &salt)
            .map_err(|err| PasswordHashError::new(err.to_string()))?;
        Ok(hash.to_string())
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, PasswordHashError> {
        let parsed = PasswordHash::new(hash).map_err(|err| PasswordHashError::new(err.to_string()))?;
        Ok(self
            .argon2
            .verify_password(plaintext.as_bytes(), &parsed)
            .is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::{Argon2PasswordHasher, PasswordHasher};

    #[test]
    fn hash_is_not_plaintext_and_verifies() {
        let hasher = Argon2PasswordHasher::new();
        let hash = hasher.hash("admin").unwrap();

        assert_ne!(hash, "admin");
        assert!(hash.starts_with("$argon2"));
        assert!(hasher.verify("admin", &hash).unwrap());
        assert!(!hasher.verify("wrong", &hash).unwrap());
    }

    #[test]
    fn same_plaintext_gets_distinct_salts() {
        let hasher = Argon2PasswordHasher::new();
        let first = hasher.hash("secret").unwrap();
        let second = hasher.hash("secret").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn verify_rejects_malformed_hash() {
        let hasher = Argon2PasswordHasher::new();
        assert!(hasher.verify("secret", "not-a-phc-string").is_err());
    }
}
