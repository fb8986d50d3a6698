//! Service Container - Centralized service access.
//!
//! Wires the credential store, hasher, token issuer and notifier into the
//! application services. Handlers only see the service traits.

use std::sync::Arc;

use super::{
    AuthService, Authenticator, PasswordResetService, ResetManager, TokenIssuer, UserManager,
    UserService,
};
use crate::config::Config;
use crate::domain::{Argon2Hasher, CredentialHasher};
use crate::errors::AppResult;
use crate::infra::{UserRepository, UserStore};
use crate::notify::{self, Notifier};

/// Service container trait for dependency injection.
pub trait ServiceContainer: Send + Sync {
    /// Get authentication service
    fn auth(&self) -> Arc<dyn AuthService>;

    /// Get user service
    fn users(&self) -> Arc<dyn UserService>;

    /// Get password reset service
    fn resets(&self) -> Arc<dyn PasswordResetService>;

    /// Credential store, for liveness checks
    fn store(&self) -> Arc<dyn UserRepository>;
}

/// Concrete implementation of ServiceContainer
#[derive(Clone)]
pub struct Services {
    auth_service: Arc<dyn AuthService>,
    user_service: Arc<dyn UserService>,
    reset_service: Arc<dyn PasswordResetService>,
    store: Arc<dyn UserRepository>,
}

impl Services {
    /// Build every service on top of a credential store and notifier.
    pub fn build(
        store: Arc<dyn UserRepository>,
        notifier: Arc<dyn Notifier>,
        config: &Config,
    ) -> AppResult<Self> {
        let hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2Hasher);

        let auth_service = Arc::new(Authenticator::new(
            store.clone(),
            hasher.clone(),
            TokenIssuer::from_config(config),
        ));
        let user_service = Arc::new(UserManager::new(store.clone(), hasher.clone()));
        let reset_service = Arc::new(ResetManager::new(
            store.clone(),
            hasher,
            notifier,
            &config.app_base_url,
        )?);

        Ok(Self {
            auth_service,
            user_service,
            reset_service,
            store,
        })
    }

    /// Create service container from database connection and config
    pub fn from_connection(db: sea_orm::DatabaseConnection, config: &Config) -> AppResult<Self> {
        let store = Arc::new(UserStore::new(db));
        let notifier = notify::from_config(&config.mail)?;
        Self::build(store, notifier, config)
    }
}

impl ServiceContainer for Services {
    fn auth(&self) -> Arc<dyn AuthService> {
        self.auth_service.clone()
    }

    fn users(&self) -> Arc<dyn UserService> {
        self.user_service.clone()
    }

    fn resets(&self) -> Arc<dyn PasswordResetService> {
        self.reset_service.clone()
    }

    fn store(&self) -> Arc<dyn UserRepository> {
        self.store.clone()
    }
}
