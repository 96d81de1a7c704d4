use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::model::user::{Role, User};

/// A name made only of whitespace counts as missing.
fn validate_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        let mut err = ValidationError::new("name");
        err.message = Some(Cow::Borrowed("Please enter your name."));
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[validate(custom(function = "validate_name"))]
    pub name: String,
    #[validate(email(message = "Not a valid email."))]
    pub email: String,
    #[validate(length(min = 8, message = "Password must have at least 8 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm_password: String,
    pub photo: Option<String>,
}

/// Both fields optional so a missing one maps to the login-specific message.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns `(email, password)` when both are present and non-empty.
    pub fn credentials(self) -> Option<(String, String)> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some((email, password))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide a valid email."))]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[validate(length(min = 8, message = "Password must have at least 8 characters."))]
    pub password: String,
    #[validate(must_match(other = "password", message = "Passwords do not match."))]
    pub confirm_password: String,
}

/// Public view of a user; never carries the password or reset fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        UserResponse {
            id: user.id_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            photo: user.photo.clone(),
            role: user.role,
        }
    }
}

/// Session issued by signup, login and password reset.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub token: String,
    pub user: UserResponse,
}
