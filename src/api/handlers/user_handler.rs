//! User resource handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    middleware,
    response::Json,
    routing::{get, post},
    Extension, Router,
};
use uuid::Uuid;

use crate::api::extractors::Fields;
use crate::api::middleware::auth_middleware;
use crate::api::AppState;
use crate::domain::{CreateUser, Principal, UpdateUser, UserResponse};
use crate::errors::AppResult;

/// Create user routes. Creation is public, everything else needs a token.
pub fn user_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_current_user))
        .route("/:id", get(get_user).put(update_user))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
        .route("/", post(create_user))
}

/// Create a user record
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already taken")
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Fields(fields): Fields,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = state.user_service.create(&fields).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get the authenticated user
#[utoipa::path(
    get,
    path = "/users/me",
    tag = "Users",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn get_current_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get(&principal, principal.id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Get user by ID (owner or admin)
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.get(&principal, id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Update user (owner or admin). Only submitted fields change.
#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "Users",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email already taken")
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(id): Path<Uuid>,
    Fields(fields): Fields,
) -> AppResult<Json<UserResponse>> {
    let user = state.user_service.update(&principal, id, &fields).await?;
    Ok(Json(UserResponse::from(user)))
}
