use chrono::{DateTime, Duration, Utc};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::PasswordResetConfig;

/// A freshly generated reset secret.
///
/// `plain` goes out in the email and is never stored; `hash` and `expires_at`
/// are persisted on the user record.
#[derive(Debug, Clone)]
pub struct IssuedResetToken {
    pub plain: String,
    pub hash: String,
    pub expires_at: DateTime<Utc>,
}

/// One-way digest used both to store a reset token and to look it up again.
pub fn hash_reset_token(plain: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(plain.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct PasswordResetUtils {
    pub config: PasswordResetConfig,
}

impl PasswordResetUtils {
    pub fn new(config: PasswordResetConfig) -> Self {
        PasswordResetUtils { config }
    }

    /// Generate a hex-encoded random secret and its expiry, relative to `now`.
    pub fn generate_reset_token(&self, now: DateTime<Utc>) -> IssuedResetToken {
        let mut bytes = vec![0u8; self.config.token_bytes];
        OsRng.fill_bytes(&mut bytes);
        let plain: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
        let hash = hash_reset_token(&plain);
        let expires_at = now + Duration::seconds(self.config.token_expiration_secs as i64);

        debug!("Generated reset token expiring at {}", expires_at);
        IssuedResetToken { plain, hash, expires_at }
    }
}
