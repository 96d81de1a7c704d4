use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use tracing::{error, info, instrument, warn};

use crate::config::{AdminUserConfig, PasswordResetConfig};
use crate::dto::user_dto::{AuthSession, SignupRequest, UserResponse};
use crate::model::user::{Role, User};
use crate::repository::user_repo::UserRepository;
use crate::util::email::{EmailMessage, EmailService};
use crate::util::error::ServiceError;
use crate::util::jwt::JwtTokenUtils;
use crate::util::password::PasswordUtilsImpl;
use crate::util::password_reset::{hash_reset_token, PasswordResetUtils};

pub const INVALID_CREDENTIALS: &str = "Incorrect email or password.";
pub const UNKNOWN_EMAIL: &str = "We could not find a user with that email.";
pub const RESET_EMAIL_FAILED: &str = "There was an error sending the password reset email. Please try again later.";
pub const RESET_TOKEN_INVALID: &str = "Token is invalid or has expired.";
pub const RESET_LINK_SENT: &str = "Password reset link sent to the user email.";

#[async_trait]
pub trait UserService: Send + Sync {
    async fn signup(&self, request: SignupRequest) -> Result<AuthSession, ServiceError>;
    async fn login(&self, email: String, password: String) -> Result<String, ServiceError>;
    /// `request_host` is used to build the reset link when no public base URL is configured.
    async fn forgot_password(&self, email: &str, request_host: &str) -> Result<(), ServiceError>;
    async fn reset_password(&self, token: &str, password: String) -> Result<String, ServiceError>;
    /// Create the configured admin unless that email is already registered. Returns whether one was created.
    async fn ensure_admin(&self, admin: &AdminUserConfig) -> Result<bool, ServiceError>;
}

pub struct UserServiceImpl {
    pub user_repo: Arc<dyn UserRepository>,
    pub jwt_utils: Arc<dyn JwtTokenUtils>,
    pub mailer: Arc<dyn EmailService>,
    pub reset_utils: PasswordResetUtils,
}

impl UserServiceImpl {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        jwt_utils: Arc<dyn JwtTokenUtils>,
        mailer: Arc<dyn EmailService>,
        reset_config: PasswordResetConfig,
    ) -> Self {
        Self {
            user_repo,
            jwt_utils,
            mailer,
            reset_utils: PasswordResetUtils::new(reset_config),
        }
    }

    /// Shared by signup and the admin bootstrap; the role never comes from the client.
    async fn create_user(
        &self,
        name: &str,
        email: &str,
        password: String,
        photo: Option<String>,
        role: Role,
    ) -> Result<User, ServiceError> {
        let hash = PasswordUtilsImpl::hash_password_async(password).await?;
        let mut user = User::new(name.trim(), email, hash);
        user.photo = photo;
        user.role = role;
        Ok(self.user_repo.insert(user).await?)
    }
}

/// `iat` has whole-second resolution; rounding up keeps a token issued with a password change fresh.
pub fn next_whole_second(now: DateTime<Utc>) -> DateTime<Utc> {
    if now.timestamp_subsec_nanos() == 0 {
        return now;
    }
    Utc.timestamp_opt(now.timestamp() + 1, 0).single().unwrap_or(now)
}

#[async_trait]
impl UserService for UserServiceImpl {
    #[instrument(skip(self, request), fields(email = %request.email))]
    async fn signup(&self, request: SignupRequest) -> Result<AuthSession, ServiceError> {
        info!("Registering new user");
        let inserted = self
            .create_user(&request.name, &request.email, request.password, request.photo, Role::User)
            .await?;
        let token = self.jwt_utils.issue_token(&inserted.id_hex())?;

        info!(user_id = %inserted.id_hex(), "User registered");
        Ok(AuthSession {
            token,
            user: UserResponse::from(&inserted),
        })
    }

    #[instrument(skip(self, password), fields(email = %email))]
    async fn login(&self, email: String, password: String) -> Result<String, ServiceError> {
        info!("User login attempt");
        let user = match self.user_repo.find_by_email(&email, true).await? {
            Some(user) => user,
            None => {
                warn!("Login for unknown email");
                return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
            }
        };

        let stored_hash = user
            .password
            .clone()
            .ok_or_else(|| ServiceError::Internal("User record has no password hash".to_string()))?;
        if !PasswordUtilsImpl::verify_password_async(password, stored_hash).await? {
            warn!("Password mismatch on login");
            return Err(ServiceError::Authentication(INVALID_CREDENTIALS.to_string()));
        }

        let token = self.jwt_utils.issue_token(&user.id_hex())?;
        info!(user_id = %user.id_hex(), "User logged in");
        Ok(token)
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn forgot_password(&self, email: &str, request_host: &str) -> Result<(), ServiceError> {
        let mut user = self
            .user_repo
            .find_by_email(email, false)
            .await?
            .ok_or_else(|| ServiceError::NotFound(UNKNOWN_EMAIL.to_string()))?;

        let issued = self.reset_utils.generate_reset_token(Utc::now());
        user.set_reset_token(&issued);
        self.user_repo.save(&user, false).await?;

        let config = &self.reset_utils.config;
        let reset_url = config.generate_reset_url(request_host, &issued.plain);
        let message = EmailMessage::password_reset(&user.email, &reset_url, config.expiration_minutes());

        if let Err(e) = self.mailer.send_email(message).await {
            error!("Failed to send password reset email: {}", e);
            user.clear_reset_token();
            if let Err(save_err) = self.user_repo.save(&user, false).await {
                error!("Failed to clear reset token after email failure: {}", save_err);
            }
            return Err(ServiceError::EmailDelivery(RESET_EMAIL_FAILED.to_string()));
        }

        info!(user_id = %user.id_hex(), "Password reset email sent");
        Ok(())
    }

    #[instrument(skip(self, token, password))]
    async fn reset_password(&self, token: &str, password: String) -> Result<String, ServiceError> {
        let now = Utc::now();
        let mut user = self
            .user_repo
            .find_by_reset_token(&hash_reset_token(token), now)
            .await?
            .ok_or_else(|| ServiceError::Validation(RESET_TOKEN_INVALID.to_string()))?;

        user.password = Some(PasswordUtilsImpl::hash_password_async(password).await?);
        user.password_changed_at = Some(bson::DateTime::from_chrono(now));
        user.clear_reset_token();
        self.user_repo.save(&user, true).await?;

        let token = self.jwt_utils.issue_token_at(&user.id_hex(), next_whole_second(now))?;
        info!(user_id = %user.id_hex(), "Password reset completed");
        Ok(token)
    }

    #[instrument(skip(self, admin), fields(email = %admin.email))]
    async fn ensure_admin(&self, admin: &AdminUserConfig) -> Result<bool, ServiceError> {
        if self.user_repo.find_by_email(&admin.email, false).await?.is_some() {
            info!("Admin user already exists, skipping creation");
            return Ok(false);
        }

        let created = self
            .create_user(&admin.name, &admin.email, admin.password.clone(), None, Role::Admin)
            .await?;
        info!(user_id = %created.id_hex(), "First admin user created");
        Ok(true)
    }
}
