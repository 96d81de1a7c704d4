use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::JwtConfig;

/// JWT token claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID, hex ObjectId)
    pub sub: String,
    /// Issued at timestamp (seconds)
    pub iat: i64,
    /// Expiration timestamp (seconds)
    pub exp: i64,
    /// JWT ID
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

/// Identity recovered from a verified token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: String,
    pub issued_at: i64,
}

/// Error types for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to encode JWT token: {0}")]
    EncodingFailed(String),
    #[error("Failed to decode JWT token: {0}")]
    DecodingFailed(String),
    #[error("Token has expired")]
    TokenExpired,
    #[error("Invalid token format")]
    InvalidToken,
}

pub trait JwtTokenUtils: Send + Sync {
    fn issue_token(&self, user_id: &str) -> Result<String, JwtError>;
    fn issue_token_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, JwtError>;
    fn verify_token(&self, token: &str) -> Result<VerifiedToken, JwtError>;
    fn extract_token_from_header(&self, auth_header: &str) -> Result<String, JwtError>;
}

#[derive(Debug, Clone)]
pub struct JwtTokenUtilsImpl {
    pub jwt_config: JwtConfig,
}

impl JwtTokenUtilsImpl {
    pub fn new(jwt_config: JwtConfig) -> Self {
        JwtTokenUtilsImpl { jwt_config }
    }

    fn validation(&self) -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        if let Some(ref issuer) = self.jwt_config.jwt_issuer {
            validation.set_issuer(&[issuer]);
        }
        validation
    }
}

impl JwtTokenUtils for JwtTokenUtilsImpl {
    fn issue_token(&self, user_id: &str) -> Result<String, JwtError> {
        self.issue_token_at(user_id, Utc::now())
    }

    fn issue_token_at(&self, user_id: &str, now: DateTime<Utc>) -> Result<String, JwtError> {
        debug!("Issuing login token for user: {}", user_id);

        let expiration = Duration::try_minutes(self.jwt_config.token_expiration)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                error!("Token expiration of {} minutes is out of range", self.jwt_config.token_expiration);
                JwtError::EncodingFailed("token expiration is out of range".to_string())
            })?;
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
            iss: self.jwt_config.jwt_issuer.clone(),
        };

        let encoding_key = EncodingKey::from_secret(self.jwt_config.jwt_secret.as_bytes());
        match encode(&Header::new(Algorithm::HS256), &claims, &encoding_key) {
            Ok(token) => {
                info!("Issued login token for user: {}", user_id);
                Ok(token)
            }
            Err(err) => {
                error!("Failed to encode JWT token: {}", err);
                Err(JwtError::EncodingFailed(err.to_string()))
            }
        }
    }

    fn verify_token(&self, token: &str) -> Result<VerifiedToken, JwtError> {
        debug!("Validating JWT token");

        let decoding_key = DecodingKey::from_secret(self.jwt_config.jwt_secret.as_bytes());
        match decode::<Claims>(token, &decoding_key, &self.validation()) {
            Ok(token_data) => {
                let claims = token_data.claims;
                debug!("Token validation successful for user: {}", claims.sub);
                Ok(VerifiedToken {
                    user_id: claims.sub,
                    issued_at: claims.iat,
                })
            }
            Err(err) if matches!(err.kind(), ErrorKind::ExpiredSignature) => {
                warn!("Token has expired");
                Err(JwtError::TokenExpired)
            }
            Err(err) => {
                error!("Failed to decode JWT token: {}", err);
                Err(JwtError::DecodingFailed(err.to_string()))
            }
        }
    }

    fn extract_token_from_header(&self, auth_header: &str) -> Result<String, JwtError> {
        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| {
                error!("Invalid authorization header format");
                JwtError::InvalidToken
            })?
            .trim();

        if token.is_empty() {
            error!("Empty token in authorization header");
            return Err(JwtError::InvalidToken);
        }

        Ok(token.to_string())
    }
}
