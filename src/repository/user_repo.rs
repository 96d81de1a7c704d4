use async_trait::async_trait;
use bson::{doc, oid::ObjectId, Document};
use chrono::{DateTime, Utc};
use mongodb::{
    options::{FindOneOptions, IndexOptions},
    Collection, Database, IndexModel,
};
use tracing::{error, info, instrument};

use crate::model::user::{normalize_email, User};
use crate::repository::repository_error::{RepositoryError, RepositoryResult};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; a taken email is `AlreadyExists`.
    async fn insert(&self, user: User) -> RepositoryResult<User>;
    /// The password hash is only loaded when `include_password` is set.
    async fn find_by_email(&self, email: &str, include_password: bool) -> RepositoryResult<Option<User>>;
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>>;
    /// Match a stored reset-token hash that has not expired at `now`.
    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> RepositoryResult<Option<User>>;
    /// Persist the mutable fields of an existing user. `None` reset fields are removed.
    /// With `validate` unset the field checks are skipped, as when only reset fields change.
    async fn save(&self, user: &User, validate: bool) -> RepositoryResult<()>;
    async fn ensure_indexes(&self) -> RepositoryResult<()>;
}

pub struct MongoUserRepository {
    collection: Collection<User>,
}

impl MongoUserRepository {
    pub fn new(db: &Database, collection_name: &str) -> Self {
        MongoUserRepository {
            collection: db.collection::<User>(collection_name),
        }
    }

    fn without_password() -> FindOneOptions {
        FindOneOptions::builder().projection(doc! { "password": 0 }).build()
    }
}

/// `$set` for present fields, `$unset` for cleared reset fields.
fn save_update(user: &User) -> Document {
    let mut set = doc! {
        "name": user.name.clone(),
        "email": normalize_email(&user.email),
        "role": user.role.as_str(),
    };
    let mut unset = Document::new();

    if let Some(ref photo) = user.photo {
        set.insert("photo", photo.clone());
    }
    if let Some(ref password) = user.password {
        set.insert("password", password.clone());
    }
    if let Some(changed_at) = user.password_changed_at {
        set.insert("passwordChangedAt", changed_at);
    }
    match user.password_reset_token {
        Some(ref token) => set.insert("passwordResetToken", token.clone()),
        None => unset.insert("passwordResetToken", ""),
    };
    match user.password_reset_token_expire_date {
        Some(expires_at) => set.insert("passwordResetTokenExpireDate", expires_at),
        None => unset.insert("passwordResetTokenExpireDate", ""),
    };

    let mut update = doc! { "$set": set };
    if !unset.is_empty() {
        update.insert("$unset", unset);
    }
    update
}

#[async_trait]
impl UserRepository for MongoUserRepository {
    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn insert(&self, mut user: User) -> RepositoryResult<User> {
        info!("Creating new user");
        user.id = Some(ObjectId::new());
        user.email = normalize_email(&user.email);

        match self.collection.insert_one(&user, None).await {
            Ok(_) => {
                info!("User created successfully");
                Ok(user)
            }
            Err(e) => {
                let err = RepositoryError::from(e).on_duplicate("A user with this email already exists.");
                error!("Failed to create user: {}", err);
                Err(err)
            }
        }
    }

    #[instrument(skip(self))]
    async fn find_by_email(&self, email: &str, include_password: bool) -> RepositoryResult<Option<User>> {
        let filter = doc! { "email": normalize_email(email) };
        let options = if include_password { None } else { Some(Self::without_password()) };
        self.collection.find_one(filter, options).await.map_err(|e| {
            error!("Failed to find user by email: {}", e);
            RepositoryError::from(e)
        })
    }

    #[instrument(skip(self), fields(id = %id))]
    async fn find_by_id(&self, id: &ObjectId) -> RepositoryResult<Option<User>> {
        let filter = doc! { "_id": *id };
        self.collection
            .find_one(filter, Self::without_password())
            .await
            .map_err(|e| {
                error!("Failed to find user by id: {}", e);
                RepositoryError::from(e)
            })
    }

    #[instrument(skip(self, token_hash))]
    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> RepositoryResult<Option<User>> {
        let filter = doc! {
            "passwordResetToken": token_hash,
            "passwordResetTokenExpireDate": { "$gt": bson::DateTime::from_chrono(now) },
        };
        self.collection
            .find_one(filter, Self::without_password())
            .await
            .map_err(|e| {
                error!("Failed to find user by reset token: {}", e);
                RepositoryError::from(e)
            })
    }

    #[instrument(skip(self, user), fields(id = %user.id_hex()))]
    async fn save(&self, user: &User, validate: bool) -> RepositoryResult<()> {
        let id = user
            .id
            .ok_or_else(|| RepositoryError::validation("Cannot save a user without an id"))?;
        if validate {
            user.validate_fields().map_err(|msg| {
                error!("User failed validation on save: {}", msg);
                RepositoryError::validation(msg)
            })?;
        }
        let update = save_update(user);

        match self.collection.update_one(doc! { "_id": id }, update, None).await {
            Ok(result) if result.matched_count > 0 => {
                info!("User saved");
                Ok(())
            }
            Ok(_) => {
                error!("No user found to save for ID: {}", id);
                Err(RepositoryError::not_found(format!("No user found with id {}", id)))
            }
            Err(e) => {
                let err = RepositoryError::from(e).on_duplicate("A user with this email already exists.");
                error!("Failed to save user: {}", err);
                Err(err)
            }
        }
    }

    async fn ensure_indexes(&self) -> RepositoryResult<()> {
        let index = IndexModel::builder()
            .keys(doc! { "email": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index, None).await?;
        info!("User indexes ensured");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::user::Role;

    #[test]
    fn test_save_update_unsets_cleared_reset_fields() {
        let mut user = User::new("Jane", "Jane@Example.com", "$argon2id$hash".to_string());
        user.role = Role::Admin;
        let update = save_update(&user);

        let set = update.get_document("$set").unwrap();
        assert_eq!(set.get_str("email").unwrap(), "jane@example.com");
        assert_eq!(set.get_str("role").unwrap(), "admin");
        assert_eq!(set.get_str("password").unwrap(), "$argon2id$hash");

        let unset = update.get_document("$unset").unwrap();
        assert!(unset.contains_key("passwordResetToken"));
        assert!(unset.contains_key("passwordResetTokenExpireDate"));
    }

    #[test]
    fn test_save_update_keeps_password_when_not_loaded() {
        let mut user = User::new("Jane", "jane@example.com", String::new());
        user.password = None;
        user.password_reset_token = Some("hash".to_string());
        user.password_reset_token_expire_date = Some(bson::DateTime::now());

        let update = save_update(&user);
        let set = update.get_document("$set").unwrap();
        assert!(!set.contains_key("password"));
        assert_eq!(set.get_str("passwordResetToken").unwrap(), "hash");
        assert!(update.get("$unset").is_none());
    }
}
