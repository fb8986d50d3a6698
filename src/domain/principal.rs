//! Authenticated principal passed explicitly into service calls.

use std::collections::BTreeSet;

use uuid::Uuid;

use super::user::effective_roles;
use crate::config::ROLE_ADMIN;

/// Identity of the caller, taken from a verified access token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub roles: BTreeSet<String>,
}

impl Principal {
    pub fn new<I, S>(id: Uuid, email: impl Into<String>, roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let roles: Vec<String> = roles.into_iter().map(Into::into).collect();
        Self {
            id,
            email: email.into(),
            roles: effective_roles(&roles),
        }
    }

    /// Check if principal has admin role.
    pub fn is_admin(&self) -> bool {
        self.roles.contains(ROLE_ADMIN)
    }

    /// Whether the principal may act on the record `id`.
    pub fn can_manage(&self, id: Uuid) -> bool {
        self.id == id || self.is_admin()
    }
}
