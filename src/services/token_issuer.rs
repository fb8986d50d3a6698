//! Access token issuance.
//!
//! A login builds the base claims (`username`, `roles`, `iat`, `exp`),
//! passes them through [`on_issue`] and hands the result to a
//! [`TokenSigner`].

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

#[cfg(any(test, feature = "test-utils"))]
use mockall::automock;

use crate::config::{Config, CLAIM_USER_ID, JWT_CONTENT_TYPE, SECONDS_PER_HOUR, TOKEN_TYPE_BEARER};
use crate::domain::User;
use crate::errors::{AppError, AppResult};

/// Claim set as handed to the signer
pub type ClaimsMap = Map<String, Value>;

/// Decoded JWT claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Login identifier (the user's email)
    pub username: String,
    pub roles: Vec<String>,
    /// Stable user identifier added at issuance
    pub id: Uuid,
    pub iat: i64,
    pub exp: i64,
}

/// Token response returned after successful authentication
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// JWT access token
    #[schema(example = "eyJhbGciOiJIUzI1NiIsImN0eSI6IkpXVCJ9...")]
    pub access_token: String,
    /// Token type (always "Bearer")
    #[schema(example = "Bearer")]
    pub token_type: String,
    /// Token expiration time in seconds
    #[schema(example = 3600)]
    pub expires_in: i64,
}

/// Issuance hook, run once per successful login before signing.
///
/// Adds the user's id to the claims and marks the inner content type in
/// the header. Errors abort the issuance.
pub fn on_issue(
    mut claims: ClaimsMap,
    mut header: Header,
    user: &User,
) -> AppResult<(ClaimsMap, Header)> {
    let id = serde_json::to_value(user.id)
        .map_err(|e| AppError::internal(format!("Failed to encode user id claim: {}", e)))?;
    claims.insert(CLAIM_USER_ID.to_string(), id);
    header.cty = Some(JWT_CONTENT_TYPE.to_string());
    Ok((claims, header))
}

/// Signs and verifies tokens.
#[cfg_attr(any(test, feature = "test-utils"), automock)]
pub trait TokenSigner: Send + Sync {
    fn sign(&self, header: &Header, claims: &ClaimsMap) -> AppResult<String>;

    fn verify(&self, token: &str) -> AppResult<Claims>;
}

/// HMAC-SHA256 signer keyed by the configured secret
#[derive(Clone)]
pub struct JwtSigner {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl JwtSigner {
    pub fn new(config: &Config) -> Self {
        Self {
            encoding: EncodingKey::from_secret(config.jwt_secret_bytes()),
            decoding: DecodingKey::from_secret(config.jwt_secret_bytes()),
        }
    }
}

impl TokenSigner for JwtSigner {
    fn sign(&self, header: &Header, claims: &ClaimsMap) -> AppResult<String> {
        // A signing failure is a key or header misconfiguration, not a bad token
        encode(header, claims, &self.encoding)
            .map_err(|e| AppError::internal(format!("Failed to sign access token: {}", e)))
    }

    fn verify(&self, token: &str) -> AppResult<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(token_data.claims)
    }
}

/// Builds, augments and signs access tokens
#[derive(Clone)]
pub struct TokenIssuer {
    signer: Arc<dyn TokenSigner>,
    expiration_hours: i64,
}

impl TokenIssuer {
    pub fn new(signer: Arc<dyn TokenSigner>, expiration_hours: i64) -> Self {
        Self {
            signer,
            expiration_hours,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(Arc::new(JwtSigner::new(config)), config.jwt_expiration_hours)
    }

    /// Issue a signed access token for an authenticated user.
    pub fn issue(&self, user: &User) -> AppResult<TokenResponse> {
        let now = Utc::now();
        let expires_at = now + Duration::hours(self.expiration_hours);

        let roles: Vec<String> = user.roles().into_iter().collect();
        let mut claims = ClaimsMap::new();
        claims.insert("username".to_string(), Value::from(user.email.clone()));
        claims.insert("roles".to_string(), Value::from(roles));
        claims.insert("iat".to_string(), Value::from(now.timestamp()));
        claims.insert("exp".to_string(), Value::from(expires_at.timestamp()));

        let (claims, header) = on_issue(claims, Header::new(Algorithm::HS256), user)?;
        let access_token = self.signer.sign(&header, &claims)?;

        Ok(TokenResponse {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in: self.expiration_hours * SECONDS_PER_HOUR,
        })
    }

    /// Verify a token and extract its claims
    pub fn verify(&self, token: &str) -> AppResult<Claims> {
        self.signer.verify(token)
    }
}
