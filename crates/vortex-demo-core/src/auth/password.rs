use argon2::password_hash::{
    PasswordHash as PhcString, PasswordHasher, PasswordVerifier, SaltString,
};
use argon2::Argon2;
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),
}

/// A stored password digest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordHash {
    /// Unsalted single-round SHA-256, lowercase hex.
    ///
    /// Only the demo fixtures use this. It is not a safe way to store
    /// real passwords.
    Sha256(String),
    /// Argon2id PHC string with its own salt and parameters.
    Argon2(String),
}

impl PasswordHash {
    pub fn sha256(password: &str) -> Self {
        Self::Sha256(sha256_hex(password))
    }

    /// Hash with Argon2id and a fresh random salt
    pub fn argon2(password: &str) -> Result<Self, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);
        let phc = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| PasswordError::Hashing(e.to_string()))?;
        Ok(Self::Argon2(phc.to_string()))
    }

    /// Check a plaintext password against this digest.
    /// An unparseable Argon2 string never matches.
    pub fn verify(&self, password: &str) -> bool {
        match self {
            Self::Sha256(expected) => sha256_hex(password) == *expected,
            Self::Argon2(phc) => match PhcString::new(phc) {
                Ok(parsed) => Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
                Err(_) => false,
            },
        }
    }
}

fn sha256_hex(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}
