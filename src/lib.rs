//! Credential Service - user credential lifecycle over HTTP
//!
//! Registration, login with JWT issuance, password reset by emailed
//! single-use token, and account records whose passwords are hashed on
//! every write path.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Users, roles, password hashing, reset tokens
//! - **services**: Authentication, token issuance, password reset, write guard
//! - **infra**: Database, migrations and credential stores
//! - **notify**: Outgoing email
//! - **api**: HTTP handlers, middleware, and routes
//! - **types**: Shared response types
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod notify;
pub mod services;
pub mod types;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Config;
pub use domain::{Password, Principal, User};
pub use errors::{AppError, AppResult};
