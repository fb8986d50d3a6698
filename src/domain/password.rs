//! Password hashing - the one-way transform applied on every write path.
//!
//! `CredentialHasher` is the contract used by registration, reset
//! redemption and the write guard. `Argon2Hasher` is the production
//! implementation built on the `Password` value object.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use super::User;
use crate::errors::{AppError, AppResult};

/// Well-formed Argon2 hash that matches no password. Verifying against it
/// keeps the cost of a lookup miss equal to a wrong password.
pub const TIMING_DUMMY_HASH: &str =
    "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

/// Slow, salted, one-way password transform.
///
/// Errors from either method signal a configuration or cryptographic
/// failure and must be propagated, never treated as a mismatch.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait CredentialHasher: Send + Sync {
    /// Hash `plaintext` for storage on `user`.
    fn hash(&self, plaintext: &str, user: &User) -> AppResult<String>;

    /// Check `plaintext` against a stored hash.
    fn verify(&self, plaintext: &str, hash: &str, user: &User) -> AppResult<bool>;
}

/// Password value object holding an Argon2 PHC string.
#[derive(Clone)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Hash a plaintext password with a fresh random salt.
    pub fn new(plain_text: &str) -> AppResult<Self> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Self::argon2()
            .hash_password(plain_text.as_bytes(), &salt)
            .map_err(|e| AppError::Hashing(format!("Password hash failed: {}", e)))?
            .to_string();
        Ok(Self { hash })
    }

    /// Wrap an existing hash (from the store).
    pub fn from_hash(hash: impl Into<String>) -> Self {
        Self { hash: hash.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }

    pub fn into_string(self) -> String {
        self.hash
    }

    /// Verify a plain text password against this hash.
    ///
    /// A stored value that is not a valid PHC string is an error.
    pub fn verify(&self, plain_text: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(&self.hash)
            .map_err(|e| AppError::Hashing(format!("Invalid hash format: {}", e)))?;
        Ok(Self::argon2()
            .verify_password(plain_text.as_bytes(), &parsed)
            .is_ok())
    }

    #[inline]
    fn argon2() -> Argon2<'static> {
        Argon2::default()
    }
}

/// Argon2id hasher with default parameters. Salts are random per hash,
/// so the user is not needed to derive one.
#[derive(Debug, Clone, Copy, Default)]
pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, plaintext: &str, _user: &User) -> AppResult<String> {
        Password::new(plaintext).map(Password::into_string)
    }

    fn verify(&self, plaintext: &str, hash: &str, _user: &User) -> AppResult<bool> {
        Password::from_hash(hash).verify(plaintext)
    }
}
