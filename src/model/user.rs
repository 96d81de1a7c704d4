use bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::ValidateEmail;

use crate::util::password_reset::IssuedResetToken;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account document as stored in the `users` collection.
///
/// `password` holds the Argon2 hash and is only present when the query asked for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_changed_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_reset_token_expire_date: Option<DateTime>,
}

impl User {
    pub fn new(name: impl Into<String>, email: &str, password_hash: String) -> Self {
        User {
            id: None,
            name: name.into(),
            email: normalize_email(email),
            photo: None,
            role: Role::User,
            password: Some(password_hash),
            password_changed_at: None,
            password_reset_token: None,
            password_reset_token_expire_date: None,
        }
    }

    /// True when the password changed after a token issued at `issued_at` (unix seconds).
    ///
    /// The change time keeps its milliseconds, so a token from earlier in the same second is stale.
    pub fn has_password_changed_after(&self, issued_at: i64) -> bool {
        match self.password_changed_at {
            Some(changed_at) => changed_at.timestamp_millis() > issued_at.saturating_mul(1000),
            None => false,
        }
    }

    /// Field checks run by a validating save. Returns the first failure message.
    pub fn validate_fields(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Please enter your name.".to_string());
        }
        if !self.email.validate_email() {
            return Err("Not a valid email.".to_string());
        }
        if self.password.as_deref().is_some_and(str::is_empty) {
            return Err("Password hash must not be empty.".to_string());
        }
        Ok(())
    }

    pub fn set_reset_token(&mut self, issued: &IssuedResetToken) {
        self.password_reset_token = Some(issued.hash.clone());
        self.password_reset_token_expire_date = Some(DateTime::from_chrono(issued.expires_at));
    }

    pub fn clear_reset_token(&mut self) {
        self.password_reset_token = None;
        self.password_reset_token_expire_date = None;
    }

    pub fn id_hex(&self) -> String {
        self.id.map(|id| id.to_hex()).unwrap_or_default()
    }
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
