use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// Largest accepted login token lifetime (ten years).
pub const MAX_TOKEN_EXPIRATION_MINUTES: i64 = 10 * 366 * 24 * 60;

/// JWT configuration structure
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// JWT secret key for signing tokens
    pub jwt_secret: String,
    /// Login token lifetime in minutes
    pub token_expiration: i64,
    /// JWT issuer (optional)
    pub jwt_issuer: Option<String>,
}

impl JwtConfig {
    /// Load JWT configuration from environment variables
    ///
    /// Expected environment variables:
    /// - JWT_SECRET: Secret key for signing JWT tokens (required, at least 32 chars)
    /// - JWT_EXPIRY_MINUTES: Token lifetime in minutes (defaults to 1440 = 1 day)
    /// - JWT_ISSUER: JWT issuer (optional)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading JWT configuration from environment variables");

        let jwt_secret = env::var("JWT_SECRET").map_err(|_| {
            error!("JWT_SECRET environment variable not found");
            ConfigError::EnvVarNotFound("JWT_SECRET".to_string())
        })?;
        debug!("JWT secret loaded (length: {} chars)", jwt_secret.len());

        let token_expiration = env::var("JWT_EXPIRY_MINUTES")
            .unwrap_or_else(|_| {
                warn!("JWT_EXPIRY_MINUTES not set, using default: 1440 minutes (1 day)");
                "1440".to_string()
            })
            .parse::<i64>()
            .map_err(|e| {
                error!("Invalid JWT_EXPIRY_MINUTES value: {}", e);
                ConfigError::InvalidValue(format!("JWT_EXPIRY_MINUTES: {}", e))
            })?;
        debug!("JWT token expiration: {} minutes", token_expiration);

        let jwt_issuer = env::var("JWT_ISSUER").ok();

        let config = JwtConfig {
            jwt_secret,
            token_expiration,
            jwt_issuer,
        };

        config.validate()?;
        info!("JWT configuration loaded successfully");
        Ok(config)
    }

    /// Validate the JWT configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.len() < 32 {
            error!("JWT secret is too short (minimum 32 characters required)");
            return Err(ConfigError::ValidationError(
                "JWT secret must be at least 32 characters long".to_string(),
            ));
        }

        if self.token_expiration <= 0 {
            error!("Token expiration must be greater than 0");
            return Err(ConfigError::ValidationError(
                "Token expiration must be greater than 0".to_string(),
            ));
        }

        if self.token_expiration > MAX_TOKEN_EXPIRATION_MINUTES {
            error!("Token expiration exceeds {} minutes", MAX_TOKEN_EXPIRATION_MINUTES);
            return Err(ConfigError::ValidationError(format!(
                "Token expiration must not exceed {} minutes",
                MAX_TOKEN_EXPIRATION_MINUTES
            )));
        }

        Ok(())
    }
}

impl Default for JwtConfig {
    fn default() -> Self {
        JwtConfig {
            jwt_secret: "test_secret_key_for_jwt_testing_should_be_long_enough_for_security_purposes".to_string(),
            token_expiration: 60,
            jwt_issuer: Some("cineflix-backend-test".to_string()),
        }
    }
}
