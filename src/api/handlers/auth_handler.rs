//! Authentication handlers.
//!
//! Every endpoint here accepts a JSON object or a browser form whose field
//! names carry a leading underscore (`_email`, `_password`).

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;

use crate::api::extractors::Fields;
use crate::api::AppState;
use crate::domain::{CreateUser, UserResponse};
use crate::errors::AppResult;
use crate::services::TokenResponse;
use crate::types::MessageResponse;

/// User login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// User email address
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User password
    #[schema(example = "secret123")]
    pub password: String,
}

/// Password recovery request
#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    #[schema(example = "user@example.com")]
    pub email: String,
}

/// New password submitted with a reset token
#[derive(Debug, Deserialize, ToSchema)]
pub struct ResetPasswordRequest {
    #[schema(example = "new-secret", min_length = 4)]
    pub password: String,
}

/// Create authentication routes
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/forgot-password", post(forgot_password))
        .route("/reset-password/:token", post(reset_password))
}

/// Register a new user
#[utoipa::path(
    post,
    path = "/auth/register",
    tag = "Authentication",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User registered successfully", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already taken")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Fields(fields): Fields,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let input: CreateUser = fields.parse()?;
    let user = state.auth_service.register(input).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Login and get JWT token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "Authentication",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = TokenResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Fields(fields): Fields,
) -> AppResult<Json<TokenResponse>> {
    let email = fields.require_str("email")?;
    let password = fields.require_str("password")?;

    let token = state.auth_service.login(email, password).await?;
    Ok(Json(token))
}

/// Email a password reset link
#[utoipa::path(
    post,
    path = "/auth/forgot-password",
    tag = "Authentication",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email sent", body = MessageResponse),
        (status = 400, description = "Validation error"),
        (status = 404, description = "No user with this email"),
        (status = 502, description = "Email could not be delivered")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Fields(fields): Fields,
) -> AppResult<Json<MessageResponse>> {
    let email = fields.require_str("email")?;
    state.reset_service.request_reset(email).await?;

    Ok(Json(MessageResponse::new(format!(
        "An email has been sent to {}",
        email
    ))))
}

/// Redeem a reset token and set a new password
#[utoipa::path(
    post,
    path = "/auth/reset-password/{token}",
    tag = "Authentication",
    params(("token" = String, Path, description = "Reset token from the email link")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password updated", body = MessageResponse),
        (status = 400, description = "Unknown token or invalid password")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Fields(fields): Fields,
) -> AppResult<Json<MessageResponse>> {
    let password = fields.require_str("password")?;
    state.reset_service.redeem(&token, password).await?;

    Ok(Json(MessageResponse::new("Password updated")))
}
