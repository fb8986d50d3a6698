//! Application state - Dependency injection container.

use std::sync::Arc;

use crate::infra::UserRepository;
use crate::services::{
    AuthService, PasswordResetService, ServiceContainer, Services, UserService,
};

/// Application state containing all services (DI container).
#[derive(Clone)]
pub struct AppState {
    /// Authentication service
    pub auth_service: Arc<dyn AuthService>,
    /// User service
    pub user_service: Arc<dyn UserService>,
    /// Password reset service
    pub reset_service: Arc<dyn PasswordResetService>,
    /// Credential store, used by the health check
    pub store: Arc<dyn UserRepository>,
}

impl AppState {
    /// Create application state from a service container.
    pub fn from_services(services: &Services) -> Self {
        Self {
            auth_service: services.auth(),
            user_service: services.users(),
            reset_service: services.resets(),
            store: services.store(),
        }
    }
}
