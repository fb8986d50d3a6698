//! Infrastructure layer - External systems integration
//!
//! - Database connection and migrations
//! - Credential store implementations (Postgres and in-process)

pub mod db;
pub mod repositories;

pub use db::{Database, Migrator};
pub use repositories::{MemoryUserStore, UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockUserRepository;
