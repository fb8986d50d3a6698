//! Normalized view of the fields submitted with a write request.
//!
//! Structured bodies carry fields as top-level JSON keys. Browser forms
//! name the same fields with a leading underscore (`_email`, `_password`).
//! Both shapes resolve to one map keyed by the logical field name.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::errors::{AppError, AppResult};

/// Fields submitted with a request, keyed by logical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestFields {
    values: Map<String, Value>,
}

impl RequestFields {
    /// Fields from a structured body. The body must be a JSON object.
    pub fn from_json(body: Value) -> AppResult<Self> {
        match body {
            Value::Object(values) => Ok(Self { values }),
            _ => Err(AppError::bad_request("Request body must be a JSON object")),
        }
    }

    /// Fields from form pairs. One leading underscore is stripped from each
    /// name; when a name appears twice the last value wins.
    pub fn from_form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let values = pairs
            .into_iter()
            .map(|(name, value)| {
                let name = name.as_ref();
                let logical = name.strip_prefix('_').unwrap_or(name);
                (logical.to_string(), Value::String(value.into()))
            })
            .collect();
        Self { values }
    }

    /// Whether the request explicitly carried `name`, even as `null`.
    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    /// Non-null string value of `name`.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.values.get(name).and_then(Value::as_str)
    }

    /// Required non-blank string field.
    pub fn require_str(&self, name: &str) -> AppResult<&str> {
        match self.get_str(name) {
            Some(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(AppError::invalid_field(name, format!("{} is required", name))),
        }
    }

    /// Deserialize the fields into a typed input.
    pub fn parse<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| AppError::bad_request(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_and_form_resolve_to_same_value() {
        let from_json = RequestFields::from_json(json!({ "email": "a@x.com" })).unwrap();
        let from_form = RequestFields::from_form([("_email", "a@x.com")]);

        assert_eq!(from_json.get_str("email"), Some("a@x.com"));
        assert_eq!(from_form.get_str("email"), Some("a@x.com"));
        assert_eq!(from_json, from_form);
    }

    #[test]
    fn test_contains_tracks_presence_not_value() {
        let fields = RequestFields::from_json(json!({ "password": null, "username": "bob" })).unwrap();
        assert!(fields.contains("password"));
        assert_eq!(fields.get_str("password"), None);
        assert!(!fields.contains("email"));
    }

    #[test]
    fn test_non_object_body_rejected() {
        assert!(matches!(
            RequestFields::from_json(json!(["email"])),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_require_str_rejects_blank() {
        let fields = RequestFields::from_form([("_password", "   ")]);
        assert!(matches!(
            fields.require_str("password"),
            Err(AppError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_unprefixed_form_names_kept() {
        let fields = RequestFields::from_form([("email", "a@x.com"), ("__csrf", "t")]);
        assert_eq!(fields.get_str("email"), Some("a@x.com"));
        assert!(fields.contains("_csrf"));
    }
}
