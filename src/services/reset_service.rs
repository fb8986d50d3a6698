//! Password reset: token minting, delivery and redemption.
//!
//! A user holds at most one outstanding token. Issuing overwrites the
//! previous one, and redemption clears it in the same store write that
//! sets the new hash, so a token can be redeemed at most once.

use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use url::Url;
use validator::Validate;

use crate::domain::{generate_reset_token, normalize_email, CredentialHasher, NewPassword, User};
use crate::errors::{AppError, AppResult, OptionExt};
use crate::infra::UserRepository;
use crate::notify::{templates, Notifier};

#[async_trait]
pub trait PasswordResetService: Send + Sync {
    /// Mint a token for `user`, replacing any previous one
    async fn issue(&self, user: &User) -> AppResult<String>;

    /// Exchange a token for a new password
    async fn redeem(&self, token: &str, new_password: &str) -> AppResult<User>;

    /// Issue a token for the account behind `email` and mail the link
    async fn request_reset(&self, email: &str) -> AppResult<()>;
}

pub struct ResetManager {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    notifier: Arc<dyn Notifier>,
    base_url: Url,
}

impl ResetManager {
    /// `base_url` is the public address reset links are built on.
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        notifier: Arc<dyn Notifier>,
        base_url: &str,
    ) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AppError::internal(format!("Invalid APP_BASE_URL: {}", e)))?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self {
            users,
            hasher,
            notifier,
            base_url,
        })
    }

    /// Redemption link for `token`
    pub fn reset_link(&self, token: &str) -> AppResult<Url> {
        self.base_url
            .join(&format!("auth/reset-password/{}", token))
            .map_err(|e| AppError::internal(format!("Failed to build reset link: {}", e)))
    }
}

#[async_trait]
impl PasswordResetService for ResetManager {
    async fn issue(&self, user: &User) -> AppResult<String> {
        let token = generate_reset_token();
        self.users
            .set_reset_token(user.id, Some(token.clone()))
            .await?;

        tracing::info!(user_id = %user.id, "Reset token issued");
        Ok(token)
    }

    async fn redeem(&self, token: &str, new_password: &str) -> AppResult<User> {
        NewPassword::new(new_password).validate()?;

        let user = self
            .users
            .find_by_reset_token(token)
            .await?
            .ok_or(AppError::UnknownToken)?;

        let password_hash = self.hasher.hash(new_password, &user)?;

        // A concurrent redemption may have cleared the token since the lookup
        let user = self
            .users
            .redeem_reset_token(token, &password_hash)
            .await?
            .ok_or(AppError::UnknownToken)?;

        tracing::info!(user_id = %user.id, "Reset token redeemed");
        Ok(user)
    }

    async fn request_reset(&self, email: &str) -> AppResult<()> {
        let user = self
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_not_found()?;

        let token = self.issue(&user).await?;
        let link = self.reset_link(&token)?;
        let message = templates::reset_password_email(&user.email, &link, Utc::now());

        // The token stays stored, so the user can simply ask again
        if let Err(e) = self.notifier.send(message).await {
            tracing::error!(user_id = %user.id, error = %e, "Reset email delivery failed");
            return Err(match e {
                AppError::DeliveryFailed(_) => e,
                other => AppError::DeliveryFailed(other.to_string()),
            });
        }

        Ok(())
    }
}
