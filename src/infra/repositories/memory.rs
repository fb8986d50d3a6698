//! In-process credential store.
//!
//! Backs the test suites and local runs without Postgres. A single write
//! lock covers each operation, which gives the same per-record atomicity
//! and email uniqueness as the database store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::UserRepository;
use crate::domain::User;
use crate::errors::{AppError, AppResult};

#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored users
    pub async fn len(&self) -> usize {
        self.users.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.users.read().await.is_empty()
    }
}

fn email_taken(users: &HashMap<Uuid, User>, email: &str, except: Option<Uuid>) -> bool {
    users
        .values()
        .any(|u| u.email == email && Some(u.id) != except)
}

#[async_trait]
impl UserRepository for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_reset_token(&self, token: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.reset_token.as_deref() == Some(token))
            .cloned())
    }

    async fn create(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.contains_key(&user.id) || email_taken(&users, &user.email, None) {
            return Err(AppError::EmailConflict);
        }

        let mut stored = user.clone();
        stored.reset_token = None;
        users.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn save(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if email_taken(&users, &user.email, Some(user.id)) {
            return Err(AppError::EmailConflict);
        }

        let stored = users.get_mut(&user.id).ok_or(AppError::NotFound)?;
        let reset_token = stored.reset_token.take();
        let created_at = stored.created_at;
        *stored = user.clone();
        stored.reset_token = reset_token;
        stored.created_at = created_at;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn set_reset_token(&self, id: Uuid, token: Option<String>) -> AppResult<()> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&id).ok_or(AppError::NotFound)?;
        stored.reset_token = token;
        stored.updated_at = Utc::now();
        Ok(())
    }

    async fn redeem_reset_token(
        &self,
        token: &str,
        password_hash: &str,
    ) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        let Some(stored) = users
            .values_mut()
            .find(|u| u.reset_token.as_deref() == Some(token))
        else {
            return Ok(None);
        };

        stored.password_hash = password_hash.to_string();
        stored.reset_token = None;
        stored.updated_at = Utc::now();
        Ok(Some(stored.clone()))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
