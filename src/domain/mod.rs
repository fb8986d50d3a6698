//! Domain layer - Core business entities and logic
//!
//! Users, role sets, the password hashing contract, reset token minting
//! and the normalized form of submitted request fields.

pub mod fields;
pub mod password;
pub mod principal;
pub mod reset_token;
pub mod user;

pub use fields::RequestFields;
pub use password::{Argon2Hasher, CredentialHasher, Password, TIMING_DUMMY_HASH};
pub use principal::Principal;
pub use reset_token::generate_reset_token;
pub use user::{effective_roles, normalize_email, CreateUser, NewPassword, UpdateUser, User, UserResponse};

#[cfg(any(test, feature = "test-utils"))]
pub use password::MockCredentialHasher;
