//! Authentication service - registration, credential checks and login.
//!
//! Failed logins never say whether the account exists: an unknown email
//! and a wrong password both produce `InvalidCredentials`, and both pay
//! for one hash verification.

use async_trait::async_trait;
use std::sync::Arc;
use validator::Validate;

use super::token_issuer::{Claims, TokenIssuer, TokenResponse};
use crate::domain::{normalize_email, CreateUser, CredentialHasher, User, TIMING_DUMMY_HASH};
use crate::errors::{AppError, AppResult};
use crate::infra::UserRepository;

/// Authentication service trait for dependency injection.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Register a new user with the base role set
    async fn register(&self, input: CreateUser) -> AppResult<User>;

    /// Check credentials and return the matching user
    async fn authenticate(&self, email: &str, password: &str) -> AppResult<User>;

    /// Authenticate and return a signed access token
    async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse>;

    /// Verify JWT token and extract claims
    fn verify_token(&self, token: &str) -> AppResult<Claims>;
}

/// Concrete implementation of AuthService over the credential store.
pub struct Authenticator {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    issuer: TokenIssuer,
}

impl Authenticator {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            users,
            hasher,
            issuer,
        }
    }
}

#[async_trait]
impl AuthService for Authenticator {
    async fn register(&self, input: CreateUser) -> AppResult<User> {
        // Nothing is hashed or written until every field is valid
        input.validate()?;

        let mut user = User::from_create(input);
        user.password_hash = self.hasher.hash(&user.password_hash, &user)?;

        let user = self.users.create(&user).await?;
        tracing::info!(user_id = %user.id, "User registered");
        Ok(user)
    }

    async fn authenticate(&self, email: &str, password: &str) -> AppResult<User> {
        let email = normalize_email(email);

        let Some(user) = self.users.find_by_email(&email).await? else {
            // Spend the same verification cost as a real account
            self.hasher
                .verify(password, TIMING_DUMMY_HASH, &User::placeholder())?;
            tracing::warn!(reason = "unknown_email", "Login failed");
            return Err(AppError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash, &user)? {
            tracing::warn!(reason = "wrong_password", user_id = %user.id, "Login failed");
            return Err(AppError::InvalidCredentials);
        }

        Ok(user)
    }

    async fn login(&self, email: &str, password: &str) -> AppResult<TokenResponse> {
        let user = self.authenticate(email, password).await?;
        let token = self.issuer.issue(&user)?;
        tracing::info!(user_id = %user.id, "Access token issued");
        Ok(token)
    }

    fn verify_token(&self, token: &str) -> AppResult<Claims> {
        self.issuer.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::domain::user::sample_user;
    use crate::domain::{Argon2Hasher, MockCredentialHasher, Password};
    use crate::infra::{MemoryUserStore, MockUserRepository};

    const SECRET: &str = "an-auth-service-test-secret-32-chars!";

    fn issuer() -> TokenIssuer {
        TokenIssuer::from_config(&Config::new(SECRET, "http://localhost"))
    }

    fn input(email: &str, password: &str) -> CreateUser {
        CreateUser {
            email: email.to_string(),
            username: "alice".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Smith".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = Authenticator::new(store.clone(), Arc::new(Argon2Hasher), issuer());

        let user = auth.register(input("a@x.com", "secret123")).await.unwrap();

        assert_ne!(user.password_hash, "secret123");
        assert!(Password::from_hash(&user.password_hash)
            .verify("secret123")
            .unwrap());
    }

    #[tokio::test]
    async fn test_register_invalid_input_writes_nothing() {
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash().never();
        let mut repo = MockUserRepository::new();
        repo.expect_create().never();

        let auth = Authenticator::new(Arc::new(repo), Arc::new(hasher), issuer());
        let result = auth.register(input("not-an-email", "abc")).await;

        match result {
            Err(AppError::ValidationFailed(fields)) => {
                assert!(fields.contains_key("email"));
                assert!(fields.contains_key("password"));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_register_duplicate_email_conflicts() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = Authenticator::new(store, Arc::new(Argon2Hasher), issuer());

        auth.register(input("a@x.com", "secret123")).await.unwrap();
        let result = auth.register(input("A@X.com", "other-pass")).await;
        assert!(matches!(result, Err(AppError::EmailConflict)));
    }

    #[tokio::test]
    async fn test_unknown_email_and_wrong_password_indistinguishable() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = Authenticator::new(store, Arc::new(Argon2Hasher), issuer());
        auth.register(input("a@x.com", "secret123")).await.unwrap();

        let unknown = auth.authenticate("b@x.com", "secret123").await.unwrap_err();
        let wrong = auth.authenticate("a@x.com", "wrong").await.unwrap_err();

        assert!(matches!(unknown, AppError::InvalidCredentials));
        assert!(matches!(wrong, AppError::InvalidCredentials));
        assert_eq!(unknown.to_string(), wrong.to_string());
        assert_eq!(unknown.code(), wrong.code());
    }

    #[tokio::test]
    async fn test_unknown_email_still_verifies_once() {
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email().returning(|_| Ok(None));
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_verify().times(1).returning(|_, _, _| Ok(false));

        let auth = Authenticator::new(Arc::new(repo), Arc::new(hasher), issuer());
        let result = auth.authenticate("ghost@x.com", "pw").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_hasher_failure_is_not_masked() {
        let user = sample_user("a@x.com", "not-a-phc-string");
        let mut repo = MockUserRepository::new();
        repo.expect_find_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        let auth = Authenticator::new(Arc::new(repo), Arc::new(Argon2Hasher), issuer());
        let result = auth.authenticate("a@x.com", "secret123").await;
        assert!(matches!(result, Err(AppError::Hashing(_))));
    }

    #[tokio::test]
    async fn test_login_issues_token_with_user_id() {
        let store = Arc::new(MemoryUserStore::new());
        let auth = Authenticator::new(store, Arc::new(Argon2Hasher), issuer());
        let user = auth.register(input("a@x.com", "secret123")).await.unwrap();

        let token = auth.login(" A@x.com", "secret123").await.unwrap();
        let claims = auth.verify_token(&token.access_token).unwrap();
        assert_eq!(claims.id, user.id);
        assert_eq!(claims.username, "a@x.com");
    }
}
