use serde::{Deserialize, Serialize};
use std::env;
use tracing::{debug, error, info, warn};

use crate::config::ConfigError;

/// SMTP settings for outbound account emails
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    /// Whether to use TLS encryption
    pub use_tls: bool,
    /// STARTTLS upgrade instead of a TLS wrapper connection
    pub use_starttls: bool,
    pub from_email: String,
    pub from_name: String,
    pub connection_timeout_secs: u64,
}

impl EmailConfig {
    /// Create EmailConfig from environment variables
    ///
    /// - EMAIL_HOST, EMAIL_USER, EMAIL_PASSWORD (required)
    /// - EMAIL_PORT (defaults to 2525)
    /// - EMAIL_USE_TLS / EMAIL_USE_STARTTLS (default false)
    /// - EMAIL_FROM / EMAIL_FROM_NAME (default Cineflix Support <support@cineflix.com>)
    /// - EMAIL_CONNECTION_TIMEOUT (defaults to 30 seconds)
    pub fn from_env() -> Result<Self, ConfigError> {
        info!("Loading email configuration from environment variables");

        let smtp_host = env::var("EMAIL_HOST").map_err(|_| {
            error!("EMAIL_HOST environment variable not found");
            ConfigError::EnvVarNotFound("EMAIL_HOST".to_string())
        })?;

        let smtp_port = env::var("EMAIL_PORT")
            .unwrap_or_else(|_| {
                warn!("EMAIL_PORT not set, defaulting to 2525");
                "2525".to_string()
            })
            .parse::<u16>()
            .map_err(|_| {
                error!("Invalid EMAIL_PORT value");
                ConfigError::InvalidValue("Invalid EMAIL_PORT value".to_string())
            })?;
        debug!("SMTP server: {}:{}", smtp_host, smtp_port);

        let smtp_username = env::var("EMAIL_USER").map_err(|_| {
            error!("EMAIL_USER environment variable not found");
            ConfigError::EnvVarNotFound("EMAIL_USER".to_string())
        })?;

        let smtp_password = env::var("EMAIL_PASSWORD").map_err(|_| {
            error!("EMAIL_PASSWORD environment variable not found");
            ConfigError::EnvVarNotFound("EMAIL_PASSWORD".to_string())
        })?;
        debug!("SMTP password: [REDACTED]");

        let use_tls = env::var("EMAIL_USE_TLS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);
        let use_starttls = env::var("EMAIL_USE_STARTTLS")
            .ok()
            .and_then(|v| v.parse::<bool>().ok())
            .unwrap_or(false);
        debug!("SMTP TLS: {}, STARTTLS: {}", use_tls, use_starttls);

        let from_email = env::var("EMAIL_FROM").unwrap_or_else(|_| "support@cineflix.com".to_string());
        let from_name = env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "Cineflix Support".to_string());

        let connection_timeout_secs = env::var("EMAIL_CONNECTION_TIMEOUT")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(30);

        let config = EmailConfig {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            use_tls,
            use_starttls,
            from_email,
            from_name,
            connection_timeout_secs,
        };

        config.validate()?;
        info!("Email configuration loaded successfully");
        Ok(config)
    }

    /// Create EmailConfig for testing
    pub fn from_test_env() -> Self {
        EmailConfig {
            smtp_host: "localhost".to_string(),
            smtp_port: 1025,
            smtp_username: "test".to_string(),
            smtp_password: "test".to_string(),
            use_tls: false,
            use_starttls: false,
            from_email: "support@cineflix.com".to_string(),
            from_name: "Cineflix Support".to_string(),
            connection_timeout_secs: 10,
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.smtp_host.is_empty() {
            error!("SMTP host is empty");
            return Err(ConfigError::ValidationError("SMTP host cannot be empty".to_string()));
        }

        if self.smtp_port == 0 {
            error!("SMTP port is 0");
            return Err(ConfigError::ValidationError("SMTP port cannot be 0".to_string()));
        }

        if !self.from_email.contains('@') {
            error!("Invalid from email format");
            return Err(ConfigError::ValidationError("Invalid from email format".to_string()));
        }

        if self.connection_timeout_secs == 0 {
            error!("Connection timeout is 0");
            return Err(ConfigError::ValidationError("Connection timeout cannot be 0".to_string()));
        }

        Ok(())
    }

    /// Sender mailbox in `Name <address>` form
    pub fn from_mailbox(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }
}
