//! Password hashing and verification
//!
//! Passwords are hashed with Argon2id and a per-password random salt. The async
//! variants move the work onto tokio's blocking pool so request handlers never
//! stall the runtime on a hash.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::{debug, error};

/// Error types for password operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("Failed to hash password: {0}")]
    HashingFailed(String),
    #[error("Failed to verify password: {0}")]
    VerificationFailed(String),
    #[error("Invalid password hash format")]
    InvalidHashFormat,
}

pub trait PasswordUtils {
    /// Hashes the given password using Argon2id algorithm
    fn hash_password(password: &str) -> Result<String, PasswordError>;

    /// Verifies the given password against the stored hash
    fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError>;
}

pub struct PasswordUtilsImpl;

impl PasswordUtils for PasswordUtilsImpl {
    fn hash_password(password: &str) -> Result<String, PasswordError> {
        let salt = SaltString::generate(&mut OsRng);

        match Argon2::default().hash_password(password.as_bytes(), &salt) {
            Ok(password_hash) => Ok(password_hash.to_string()),
            Err(err) => {
                error!("Failed to hash password: {}", err);
                Err(PasswordError::HashingFailed(err.to_string()))
            }
        }
    }

    fn verify_password(password: &str, hash: &str) -> Result<bool, PasswordError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|err| {
            error!("Invalid password hash format: {}", err);
            PasswordError::InvalidHashFormat
        })?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => {
                debug!("Password verification failed - invalid password");
                Ok(false)
            }
            Err(err) => {
                error!("Password verification error: {}", err);
                Err(PasswordError::VerificationFailed(err.to_string()))
            }
        }
    }
}

impl PasswordUtilsImpl {
    pub async fn hash_password_async(password: String) -> Result<String, PasswordError> {
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| PasswordError::HashingFailed(format!("hashing task failed: {}", e)))?
    }

    pub async fn verify_password_async(password: String, hash: String) -> Result<bool, PasswordError> {
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .map_err(|e| PasswordError::VerificationFailed(format!("verification task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_not_plaintext() {
        let hash = PasswordUtilsImpl::hash_password("pass1234").unwrap();
        assert_ne!(hash, "pass1234");
        assert!(hash.starts_with("$argon2"));
    }

    #[test]
    fn test_same_password_hashes_differently() {
        let first = PasswordUtilsImpl::hash_password("pass1234").unwrap();
        let second = PasswordUtilsImpl::hash_password("pass1234").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_verify_password() {
        let hash = PasswordUtilsImpl::hash_password("pass1234").unwrap();
        assert!(PasswordUtilsImpl::verify_password("pass1234", &hash).unwrap());
        assert!(!PasswordUtilsImpl::verify_password("wrong-pass", &hash).unwrap());
    }

    #[test]
    fn test_verify_against_garbage_hash() {
        assert!(matches!(
            PasswordUtilsImpl::verify_password("pass1234", "not-a-hash"),
            Err(PasswordError::InvalidHashFormat)
        ));
    }

    #[tokio::test]
    async fn test_async_round_trip() {
        let hash = PasswordUtilsImpl::hash_password_async("pass1234".to_string()).await.unwrap();
        assert!(PasswordUtilsImpl::verify_password_async("pass1234".to_string(), hash).await.unwrap());
    }
}
