//! Application services layer - Use cases and business logic.
//!
//! Services orchestrate domain logic and infrastructure to fulfill
//! application use cases. They depend on abstractions (traits) for
//! dependency inversion.

mod auth_service;
pub mod container;
mod reset_service;
pub mod token_issuer;
mod user_service;
pub mod write_guard;

// Service Container
pub use container::{ServiceContainer, Services};

// Service traits and implementations
pub use auth_service::{AuthService, Authenticator};
pub use reset_service::{PasswordResetService, ResetManager};
pub use token_issuer::{on_issue, Claims, ClaimsMap, JwtSigner, TokenIssuer, TokenResponse, TokenSigner};
pub use user_service::{UserManager, UserService};
pub use write_guard::before_persist;

#[cfg(any(test, feature = "test-utils"))]
pub use token_issuer::MockTokenSigner;
