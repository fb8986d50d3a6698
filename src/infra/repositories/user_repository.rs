//! Credential store: user records by id, email or reset token.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    sea_query::Expr,
    ActiveModelTrait,
    ActiveValue::{NotSet, Set, Unchanged},
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, SqlErr,
    Statement,
};
use uuid::Uuid;

use super::entities::user::{self, roles_to_json, ActiveModel, Entity as UserEntity};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

/// User store trait for dependency injection.
///
/// Implementations guarantee per-record atomicity and email uniqueness.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by ID
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    /// Find user by (normalized) email address
    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Find the user whose outstanding reset token equals `token`
    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>>;

    /// Insert a new user. A taken email yields `EmailConflict`.
    async fn create(&self, user: &User) -> AppResult<User>;

    /// Persist profile, password and role changes. The reset token column
    /// is only written by `set_reset_token` and `redeem_reset_token`.
    async fn save(&self, user: &User) -> AppResult<User>;

    /// Overwrite the user's reset token.
    async fn set_reset_token(&self, id: Uuid, token: Option<String>) -> AppResult<()>;

    /// Clear `token` and store `password_hash` in one conditional write.
    ///
    /// Returns `None` when no record holds `token` any more, which is what a
    /// losing concurrent redemption observes.
    async fn redeem_reset_token(&self, token: &str, password_hash: &str)
        -> AppResult<Option<User>>;

    /// Check store connectivity
    async fn ping(&self) -> AppResult<()>;
}

/// Map a write error, surfacing unique violations as email conflicts.
fn map_write_err(err: DbErr) -> AppError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => AppError::EmailConflict,
        _ => AppError::Database(err),
    }
}

/// Postgres implementation of UserRepository
pub struct UserStore {
    db: DatabaseConnection,
}

impl UserStore {
    /// Create new repository instance
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        let result = UserEntity::find_by_id(id).one(&self.db).await?;
        Ok(result.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        let result = UserEntity::find()
            .filter(user::Column::ResetToken.eq(token))
            .one(&self.db)
            .await?;

        Ok(result.map(User::from))
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let active_model = ActiveModel {
            id: Set(user.id),
            email: Set(user.email.clone()),
            username: Set(user.username.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            password_hash: Set(user.password_hash.clone()),
            roles: Set(roles_to_json(user.stored_roles())),
            reset_token: Set(None),
            created_at: Set(user.created_at),
            updated_at: Set(user.updated_at),
        };

        let model = active_model.insert(&self.db).await.map_err(map_write_err)?;
        Ok(User::from(model))
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let active = ActiveModel {
            id: Unchanged(user.id),
            email: Set(user.email.clone()),
            username: Set(user.username.clone()),
            first_name: Set(user.first_name.clone()),
            last_name: Set(user.last_name.clone()),
            password_hash: Set(user.password_hash.clone()),
            roles: Set(roles_to_json(user.stored_roles())),
            reset_token: NotSet,
            created_at: NotSet,
            updated_at: Set(Utc::now()),
        };

        match active.update(&self.db).await {
            Ok(model) => Ok(User::from(model)),
            Err(DbErr::RecordNotUpdated) => Err(AppError::NotFound),
            Err(e) => Err(map_write_err(e)),
        }
    }

    async fn set_reset_token(&self, id: Uuid, token: Option<String>) -> AppResult<()> {
        let result = UserEntity::update_many()
            .col_expr(user::Column::ResetToken, Expr::value(token))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> AppResult<Option<User>> {
        // Single UPDATE ... WHERE reset_token = $1 RETURNING *, so two
        // concurrent redemptions cannot both match the row.
        let models = UserEntity::update_many()
            .col_expr(user::Column::PasswordHash, Expr::value(password_hash))
            .col_expr(user::Column::ResetToken, Expr::value(Option::<String>::None))
            .col_expr(user::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(user::Column::ResetToken.eq(token))
            .exec_with_returning(&self.db)
            .await?;

        Ok(models.into_iter().next().map(User::from))
    }

    async fn ping(&self) -> AppResult<()> {
        self.db
            .execute(Statement::from_string(
                self.db.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}
