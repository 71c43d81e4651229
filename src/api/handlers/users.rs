//! User directory endpoints.
//!
//! Flow Overview:
//! 1) Resolve the bearer access token into an active user.
//! 2) Enforce the ownership policy (self or superuser) for id-addressed
//!    routes; listing requires superuser.
//! 3) Perform the read, update, or delete against the store.

use axum::{
    Json,
    extract::{Extension, Path, Query},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::info;

use crate::store::{DynStore, UserChanges};

use super::auth::policy::{ensure_owner_or_superuser, ensure_superuser};
use super::auth::principal::require_user;
use super::auth::types::{UserResponse, UserUpdateRequest};
use super::auth::{AuthState, password_change};
use super::error::ApiError;
use super::{Pagination, valid_email};

#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Current authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn me(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = require_user(&headers, &state, &store).await?;
    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/me",
    request_body = UserUpdateRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid input or a user with this email already exists"),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn update_me(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
    Json(payload): Json<UserUpdateRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = require_user(&headers, &state, &store).await?;

    if let Some(email) = &payload.email {
        if !valid_email(email) {
            return Err(ApiError::Validation("Invalid email address".to_string()));
        }
    }

    let mut changes = UserChanges {
        email: payload.email,
        full_name: payload.full_name,
        password_hash: None,
        is_active: payload.is_active,
    };
    // Changing the password does not revoke outstanding refresh tokens; they
    // stay usable until expiry.
    password_change(&mut changes, payload.password)?;

    let updated = store
        .update_user(user.id, changes)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(UserResponse::from(updated)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "User detail", body = UserResponse),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Not the requester's own profile and not a superuser"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn get_user(
    Path(id): Path<i64>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
) -> Result<Json<UserResponse>, ApiError> {
    let requester = require_user(&headers, &state, &store).await?;

    let user = store
        .user_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    ensure_owner_or_superuser(&requester, user.id)?;

    Ok(Json(UserResponse::from(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(Pagination),
    responses(
        (status = 200, description = "All users (superuser only)", body = [UserResponse]),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Requester is not a superuser"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn list_users(
    Query(pagination): Query<Pagination>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    let requester = require_user(&headers, &state, &store).await?;
    ensure_superuser(&requester)?;

    let users = store.list_users(pagination.page()).await?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "User deleted; owned items removed with it"),
        (status = 401, description = "Missing or invalid access token"),
        (status = 403, description = "Not the requester's own account and not a superuser"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer" = [])),
    tag = "users"
)]
pub async fn delete_user(
    Path(id): Path<i64>,
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
) -> Result<impl IntoResponse, ApiError> {
    let requester = require_user(&headers, &state, &store).await?;

    let user = store
        .user_by_id(id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    ensure_owner_or_superuser(&requester, user.id)?;

    store.delete_user(id).await?;
    info!("deleted user {id}");
    Ok(StatusCode::NO_CONTENT)
}
