//! Password hashing guard for writes that carry a user record.
//!
//! Called by the orchestration layer right before the record is handed to
//! the store. Whether `password_hash` holds plaintext is decided from the
//! request method and the submitted field set, never by inspecting the
//! value. Each incoming plaintext must pass through here exactly once.

use axum::http::Method;

use crate::domain::{CredentialHasher, RequestFields, User};
use crate::errors::AppResult;

/// Field whose presence on an update marks a new plaintext password
pub const PASSWORD_FIELD: &str = "password";

/// Whether a write with this method and field set carries a plaintext
/// password in `User::password_hash`.
pub fn carries_plaintext(method: &Method, fields: &RequestFields) -> bool {
    let is_create = *method == Method::POST;
    let is_update = *method == Method::PUT || *method == Method::PATCH;
    is_create || (is_update && fields.contains(PASSWORD_FIELD))
}

/// Hash `user.password_hash` in place when the write carries plaintext.
///
/// Returns whether the value was hashed.
pub fn before_persist(
    method: &Method,
    fields: &RequestFields,
    user: &mut User,
    hasher: &dyn CredentialHasher,
) -> AppResult<bool> {
    if !carries_plaintext(method, fields) {
        return Ok(false);
    }

    user.password_hash = hasher.hash(&user.password_hash, user)?;
    tracing::debug!(user_id = %user.id, %method, "Password hashed before persist");
    Ok(true)
}
