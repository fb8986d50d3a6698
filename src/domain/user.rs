//! User domain entity and related types.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::config::{ROLE_ADMIN, ROLE_USER};

/// Effective role set for a stored role set.
///
/// Always contains [`ROLE_USER`]; the returned set is de-duplicated and
/// the input is left untouched.
pub fn effective_roles<'a, I>(stored: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a String>,
{
    stored
        .into_iter()
        .cloned()
        .chain(std::iter::once(ROLE_USER.to_string()))
        .collect()
}

/// User domain entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Assigned by the store at creation, never changed afterwards
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Holds a hash once any write path has completed.
    #[serde(skip_serializing)]
    pub password_hash: String,
    stored_roles: BTreeSet<String>,
    /// Present only while a password reset is outstanding
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Rebuild a user from persisted parts.
    #[allow(clippy::too_many_arguments)]
    pub fn from_parts(
        id: Uuid,
        email: String,
        username: String,
        first_name: String,
        last_name: String,
        password_hash: String,
        stored_roles: BTreeSet<String>,
        reset_token: Option<String>,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            email,
            username,
            first_name,
            last_name,
            password_hash,
            stored_roles,
            reset_token,
            created_at,
            updated_at,
        }
    }

    /// Build a record from registration input with the base role set.
    ///
    /// The id is fixed here and never changes. `password_hash` carries the
    /// submitted plaintext until the hasher or write guard has run.
    pub fn from_create(input: CreateUser) -> Self {
        let now = Utc::now();
        Self::from_parts(
            Uuid::new_v4(),
            normalize_email(&input.email),
            input.username,
            input.first_name,
            input.last_name,
            input.password,
            BTreeSet::from([ROLE_USER.to_string()]),
            None,
            now,
            now,
        )
    }

    /// Empty record used where a hasher needs a user but no account matched.
    pub fn placeholder() -> Self {
        let now = Utc::now();
        Self::from_parts(
            Uuid::nil(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            BTreeSet::new(),
            None,
            now,
            now,
        )
    }

    /// Roles the user holds, including the implicit base role.
    pub fn roles(&self) -> BTreeSet<String> {
        effective_roles(&self.stored_roles)
    }

    /// Roles exactly as persisted.
    pub fn stored_roles(&self) -> &BTreeSet<String> {
        &self.stored_roles
    }

    /// Replace the persisted role set
    pub fn set_roles<I, S>(&mut self, roles: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stored_roles = roles.into_iter().map(Into::into).collect();
        self.updated_at = Utc::now();
    }

    pub fn has_role(&self, role: &str) -> bool {
        role == ROLE_USER || self.stored_roles.contains(role)
    }

    /// Check if user has admin role
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Human readable label of the highest role
    pub fn role_title(&self) -> &'static str {
        if self.is_admin() {
            "Administrator"
        } else {
            "User"
        }
    }

    /// Apply a validated partial update.
    ///
    /// A submitted password is copied verbatim into `password_hash`; the
    /// write guard hashes it before the record is saved.
    pub fn apply_update(&mut self, update: UpdateUser) {
        if let Some(email) = update.email {
            self.email = normalize_email(&email);
        }
        if let Some(username) = update.username {
            self.username = username;
        }
        if let Some(first_name) = update.first_name {
            self.first_name = first_name;
        }
        if let Some(last_name) = update.last_name {
            self.last_name = last_name;
        }
        if let Some(password) = update.password {
            self.password_hash = password;
        }
        if let Some(roles) = update.roles {
            self.stored_roles = roles.into_iter().collect();
        }
        self.updated_at = Utc::now();
    }
}

/// Lowercase and trim an email address before lookup or storage
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// User creation data transfer object
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct CreateUser {
    /// User email address
    #[serde(default)]
    #[validate(
        length(min = 1, max = 255, message = "Email must be between 1 and 255 characters"),
        email(message = "Email is not a valid address")
    )]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// Public handle (3 to 255 characters)
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "Username must be between 3 and 255 characters"))]
    #[schema(example = "jdoe")]
    pub username: String,
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "First name must be between 3 and 255 characters"))]
    #[schema(example = "John")]
    pub first_name: String,
    #[serde(default)]
    #[validate(length(min = 3, max = 255, message = "Last name must be between 3 and 255 characters"))]
    #[schema(example = "Doe")]
    pub last_name: String,
    /// Plaintext password (4 to 255 characters)
    #[serde(default)]
    #[validate(length(min = 4, max = 255, message = "Password must be between 4 and 255 characters"))]
    #[schema(example = "secret123", min_length = 4)]
    pub password: String,
}

/// User update data transfer object, only submitted fields are set
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateUser {
    #[validate(
        length(max = 255, message = "Email must be at most 255 characters"),
        email(message = "Email is not a valid address")
    )]
    pub email: Option<String>,
    #[validate(length(min = 3, max = 255, message = "Username must be between 3 and 255 characters"))]
    pub username: Option<String>,
    #[validate(length(min = 3, max = 255, message = "First name must be between 3 and 255 characters"))]
    pub first_name: Option<String>,
    #[validate(length(min = 3, max = 255, message = "Last name must be between 3 and 255 characters"))]
    pub last_name: Option<String>,
    #[validate(length(min = 4, max = 255, message = "Password must be between 4 and 255 characters"))]
    pub password: Option<String>,
    /// New role set (admin only)
    #[schema(example = json!(["ROLE_ADMIN"]))]
    pub roles: Option<Vec<String>>,
}

/// Replacement password submitted with a reset token
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct NewPassword {
    #[validate(length(min = 4, max = 255, message = "Password must be between 4 and 255 characters"))]
    pub password: String,
}

impl NewPassword {
    pub fn new(password: impl Into<String>) -> Self {
        Self {
            password: password.into(),
        }
    }
}

/// User response (safe to return to client)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(example = "user@example.com")]
    pub email: String,
    #[schema(example = "jdoe")]
    pub username: String,
    #[schema(example = "John")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "John Doe")]
    pub full_name: String,
    #[schema(example = json!(["ROLE_USER"]))]
    pub roles: Vec<String>,
    /// "Administrator" or "User"
    #[schema(example = "User")]
    pub role_title: String,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            roles: user.roles().into_iter().collect(),
            full_name: user.full_name(),
            role_title: user.role_title().to_string(),
            id: user.id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user(email: &str, password_hash: &str) -> User {
    let now = Utc::now();
    User::from_parts(
        Uuid::new_v4(),
        email.to_string(),
        "sample".to_string(),
        "Sample".to_string(),
        "Person".to_string(),
        password_hash.to_string(),
        BTreeSet::new(),
        None,
        now,
        now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_role_set_reports_base_role() {
        let user = sample_user("a@x.com", "hash");
        let roles = user.roles();
        assert_eq!(roles.len(), 1);
        assert!(roles.contains(ROLE_USER));
        assert!(user.stored_roles().is_empty());
    }

    #[test]
    fn test_explicit_base_role_not_duplicated() {
        let mut user = sample_user("a@x.com", "hash");
        user.set_roles([ROLE_USER, ROLE_ADMIN, ROLE_USER]);
        let roles: Vec<String> = user.roles().into_iter().collect();
        assert_eq!(roles, vec![ROLE_ADMIN.to_string(), ROLE_USER.to_string()]);
    }

    #[test]
    fn test_effective_roles_is_pure() {
        let stored = BTreeSet::from(["ROLE_EDITOR".to_string()]);
        let effective = effective_roles(&stored);
        assert_eq!(stored.len(), 1);
        assert!(effective.contains("ROLE_EDITOR"));
        assert!(effective.contains(ROLE_USER));
    }

    #[test]
    fn test_role_title_and_full_name() {
        let mut user = sample_user("a@x.com", "hash");
        assert_eq!(user.role_title(), "User");
        user.set_roles([ROLE_ADMIN]);
        assert_eq!(user.role_title(), "Administrator");
        assert_eq!(user.full_name(), "Sample Person");
    }

    #[test]
    fn test_create_user_validation_collects_fields() {
        let input = CreateUser {
            email: "not-an-email".into(),
            username: "ab".into(),
            first_name: "John".into(),
            last_name: "Doe".into(),
            password: "abc".into(),
        };
        let errors = input.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("email"));
        assert!(fields.contains_key("username"));
        assert!(fields.contains_key("password"));
        assert!(!fields.contains_key("first_name"));
    }

    #[test]
    fn test_overlong_email_rejected() {
        let label = "a".repeat(60);
        let email = format!("{}@{}.{}.{}.{}.com", "u".repeat(64), label, label, label, label);
        assert!(email.len() > 255);

        let input = CreateUser {
            email: email.clone(),
            username: "alice".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            password: "secret123".into(),
        };
        let errors = input.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));

        let update = UpdateUser {
            email: Some(email),
            ..Default::default()
        };
        let errors = update.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("email"));
    }

    #[test]
    fn test_new_password_bounds() {
        assert!(NewPassword::new("abc").validate().is_err());
        assert!(NewPassword::new("abcd").validate().is_ok());
        assert!(NewPassword::new("x".repeat(256)).validate().is_err());
    }

    #[test]
    fn test_created_user_gets_base_role_and_normalized_email() {
        let new_user = User::from_create(CreateUser {
            email: "  A@X.com ".into(),
            username: "alice".into(),
            first_name: "Alice".into(),
            last_name: "Smith".into(),
            password: "secret123".into(),
        });
        assert_eq!(new_user.email, "a@x.com");
        assert!(new_user.stored_roles().contains(ROLE_USER));
        assert!(new_user.reset_token.is_none());
    }

    #[test]
    fn test_response_hides_credentials() {
        let mut user = sample_user("a@x.com", "$argon2id$secret");
        user.reset_token = Some("token".into());
        let json = serde_json::to_string(&UserResponse::from(user)).unwrap();
        assert!(!json.contains("argon2"));
        assert!(!json.contains("token"));
        assert!(json.contains(ROLE_USER));
    }
}
