//! User database entity for SeaORM.

use std::collections::BTreeSet;

use sea_orm::entity::prelude::*;

use crate::domain::User;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: String,
    /// JSON array of role tags
    pub roles: Json,
    pub reset_token: Option<String>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Encode a role set for the `roles` column
pub fn roles_to_json(roles: &BTreeSet<String>) -> Json {
    Json::Array(roles.iter().cloned().map(Json::String).collect())
}

/// Decode the `roles` column, ignoring anything that is not a string
pub fn roles_from_json(value: &Json) -> BTreeSet<String> {
    value
        .as_array()
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Convert database model to domain entity
impl From<Model> for User {
    fn from(model: Model) -> Self {
        let roles = roles_from_json(&model.roles);
        User::from_parts(
            model.id,
            model.email,
            model.username,
            model.first_name,
            model.last_name,
            model.password_hash,
            roles,
            model.reset_token,
            model.created_at,
            model.updated_at,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_roles_json_roundtrip_ignores_garbage() {
        let roles = roles_from_json(&json!(["ROLE_ADMIN", 3, null, "ROLE_ADMIN"]));
        assert_eq!(roles, BTreeSet::from(["ROLE_ADMIN".to_string()]));
        assert_eq!(roles_to_json(&roles), json!(["ROLE_ADMIN"]));
        assert!(roles_from_json(&json!({"a": 1})).is_empty());
    }
}
