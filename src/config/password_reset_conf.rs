use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Route the emailed reset link points at; the token is appended as the last segment.
pub const RESET_PASSWORD_PATH: &str = "/api/v1/users/resetPassword";

/// Configuration for password reset functionality
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetConfig {
    /// Public base URL used in reset links; derived from the request Host header when unset
    pub public_base_url: Option<String>,
    /// Token expiration time in seconds
    pub token_expiration_secs: u64,
    /// Number of random bytes in a reset token (hex-encoded, so twice as many chars)
    pub token_bytes: usize,
}

impl PasswordResetConfig {
    /// Create PasswordResetConfig from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading password reset configuration from environment variables");

        let public_base_url = env::var("PUBLIC_BASE_URL").ok();
        match public_base_url {
            Some(ref url) => debug!("Public base URL: {}", url),
            None => debug!("PUBLIC_BASE_URL not set, reset links use the request host"),
        }

        let token_expiration_secs = env::var("RESET_TOKEN_EXPIRATION")
            .unwrap_or_else(|_| {
                warn!("RESET_TOKEN_EXPIRATION not set, defaulting to 600 seconds (10 minutes)");
                "600".to_string()
            })
            .parse::<u64>()
            .map_err(|_| {
                error!("Invalid RESET_TOKEN_EXPIRATION value");
                ConfigError::InvalidValue("Invalid RESET_TOKEN_EXPIRATION value".to_string())
            })?;

        let token_bytes = env::var("RESET_TOKEN_BYTES")
            .unwrap_or_else(|_| "32".to_string())
            .parse::<usize>()
            .map_err(|_| {
                error!("Invalid RESET_TOKEN_BYTES value");
                ConfigError::InvalidValue("Invalid RESET_TOKEN_BYTES value".to_string())
            })?;
        debug!("Reset token: {} bytes, expires in {} seconds", token_bytes, token_expiration_secs);

        let config = PasswordResetConfig {
            public_base_url,
            token_expiration_secs,
            token_bytes,
        };

        config.validate()?;
        info!("Password reset configuration loaded successfully");
        Ok(config)
    }

    /// Create PasswordResetConfig for testing
    pub fn from_test_env() -> Self {
        PasswordResetConfig {
            public_base_url: Some("http://localhost:3000".to_string()),
            token_expiration_secs: 600,
            token_bytes: 16,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref url) = self.public_base_url {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                error!("Public base URL must start with http:// or https://");
                return Err(ConfigError::ValidationError(
                    "Public base URL must start with http:// or https://".to_string(),
                ));
            }
        }

        if self.token_expiration_secs == 0 {
            error!("Token expiration is 0");
            return Err(ConfigError::ValidationError("Token expiration cannot be 0".to_string()));
        }

        if self.token_bytes < 16 {
            error!("Token byte length is too short");
            return Err(ConfigError::ValidationError("Token must be at least 16 bytes".to_string()));
        }

        Ok(())
    }

    /// Build the reset link emailed to the user.
    ///
    /// `request_host` is the Host header of the forgot-password request and is only
    /// consulted when no public base URL is configured.
    pub fn generate_reset_url(&self, request_host: &str, token: &str) -> String {
        let base_url = match self.public_base_url {
            Some(ref url) => url.trim_end_matches('/').to_string(),
            None => format!("http://{}", request_host),
        };
        format!("{}{}/{}", base_url, RESET_PASSWORD_PATH, token)
    }

    /// Token lifetime in whole minutes, for the email body.
    pub fn expiration_minutes(&self) -> u64 {
        (self.token_expiration_secs / 60).max(1)
    }
}

impl Default for PasswordResetConfig {
    fn default() -> Self {
        PasswordResetConfig {
            public_base_url: None,
            token_expiration_secs: 600,
            token_bytes: 32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PasswordResetConfig::default();
        assert_eq!(config.public_base_url, None);
        assert_eq!(config.token_expiration_secs, 600);
        assert_eq!(config.token_bytes, 32);
        assert_eq!(config.expiration_minutes(), 10);
    }

    #[test]
    fn test_validate_invalid_base_url() {
        let mut config = PasswordResetConfig::from_test_env();
        config.public_base_url = Some("invalid-url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_short_token() {
        let mut config = PasswordResetConfig::from_test_env();
        config.token_bytes = 8;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_generate_reset_url_with_trailing_slash() {
        let mut config = PasswordResetConfig::from_test_env();
        config.public_base_url = Some("http://localhost:3000/".to_string());
        let url = config.generate_reset_url("ignored:1234", "abc123");
        assert_eq!(url, "http://localhost:3000/api/v1/users/resetPassword/abc123");
    }

    #[test]
    fn test_generate_reset_url_from_request_host() {
        let config = PasswordResetConfig::default();
        let url = config.generate_reset_url("127.0.0.1:3000", "abc123");
        assert_eq!(url, "http://127.0.0.1:3000/api/v1/users/resetPassword/abc123");
    }
}
