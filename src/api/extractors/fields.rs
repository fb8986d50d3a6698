//! Request field extractor accepting JSON bodies and browser forms.

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header::CONTENT_TYPE,
    Form, Json,
};
use serde_json::Value;

use crate::domain::RequestFields;
use crate::errors::AppError;

/// Submitted fields, whichever body shape carried them.
///
/// `application/x-www-form-urlencoded` bodies are read as form pairs
/// (`_email=...`); anything else must be a JSON object.
///
/// # Example
///
/// ```rust,ignore
/// async fn forgot_password(Fields(fields): Fields) -> AppResult<()> {
///     let email = fields.require_str("email")?;
///     // ...
/// }
/// ```
pub struct Fields(pub RequestFields);

#[async_trait]
impl<S> FromRequest<S> for Fields
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|e| AppError::bad_request(e.body_text()))?;
            return Ok(Fields(RequestFields::from_form(pairs)));
        }

        let Json(body) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|e| AppError::bad_request(e.body_text()))?;
        Ok(Fields(RequestFields::from_json(body)?))
    }
}
