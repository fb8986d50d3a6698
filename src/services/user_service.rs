//! User service - account records created and edited through the API.
//!
//! Every write runs validation first and the password guard last, right
//! before the record reaches the store. The caller's identity is always an
//! explicit argument.

use async_trait::async_trait;
use axum::http::Method;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use super::write_guard::{before_persist, PASSWORD_FIELD};
use crate::domain::{CreateUser, CredentialHasher, Principal, RequestFields, UpdateUser, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UserRepository;

/// User service trait for dependency injection.
#[async_trait]
pub trait UserService: Send + Sync {
    /// Create a user from submitted fields
    async fn create(&self, fields: &RequestFields) -> AppResult<User>;

    /// Fetch a user the principal may see
    async fn get(&self, principal: &Principal, id: Uuid) -> AppResult<User>;

    /// Apply a partial update. Only submitted fields change.
    async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        fields: &RequestFields,
    ) -> AppResult<User>;
}

/// Concrete implementation of UserService over the credential store.
pub struct UserManager {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
}

impl UserManager {
    pub fn new(users: Arc<dyn UserRepository>, hasher: Arc<dyn CredentialHasher>) -> Self {
        Self { users, hasher }
    }
}

#[async_trait]
impl UserService for UserManager {
    async fn create(&self, fields: &RequestFields) -> AppResult<User> {
        let input: CreateUser = fields.parse()?;
        input.validate()?;

        let mut user = User::from_create(input);
        before_persist(&Method::POST, fields, &mut user, self.hasher.as_ref())?;

        let user = self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "User created");
        Ok(user)
    }

    async fn get(&self, principal: &Principal, id: Uuid) -> AppResult<User> {
        if !principal.can_manage(id) {
            return Err(AppError::Forbidden);
        }
        self.users.find_by_id(id).await?.ok_or_not_found()
    }

    async fn update(
        &self,
        principal: &Principal,
        id: Uuid,
        fields: &RequestFields,
    ) -> AppResult<User> {
        if !principal.can_manage(id) {
            return Err(AppError::Forbidden);
        }

        // A present but null password would leave the stored hash to be
        // hashed a second time
        if fields.contains(PASSWORD_FIELD) && fields.get_str(PASSWORD_FIELD).is_none() {
            return Err(AppError::invalid_field(
                PASSWORD_FIELD,
                "Password must be a string",
            ));
        }

        let update: UpdateUser = fields.parse()?;
        update.validate()?;

        if update.roles.is_some() && !principal.is_admin() {
            return Err(AppError::Forbidden);
        }

        let mut user = self.users.find_by_id(id).await?.ok_or_not_found()?;
        user.apply_update(update);
        before_persist(&Method::PUT, fields, &mut user, self.hasher.as_ref())?;

        let user = self.users.save(&user).await?;
        tracing::info!(user_id = %user.id, actor = %principal.id, "User updated");
        Ok(user)
    }
}
