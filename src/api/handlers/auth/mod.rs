//! Registration, login, refresh, and token introspection endpoints.
//!
//! Known limitation, kept deliberately: refresh tokens are not tracked
//! server-side, so they cannot be revoked on use or on password change and
//! remain valid until their natural expiry.

use axum::{
    Form, Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::password;
use crate::store::{DynStore, NewUser, UserChanges};
use crate::token::{TokenKind, unix_now};

pub mod policy;
pub mod principal;
pub mod state;
pub mod types;

pub use state::{AuthConfig, AuthState};

use super::error::ApiError;
use super::valid_email;
use principal::require_user;
use types::{LoginForm, RefreshRequest, RegisterRequest, TokenResponse, UserResponse};

pub(crate) const MIN_PASSWORD_LENGTH: usize = 6;

#[utoipa::path(
    post,
    path = "/api/v1/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registration successful", body = UserResponse),
        (status = 400, description = "Invalid input or a user with this email already exists"),
    ),
    tag = "auth"
)]
#[instrument(skip_all, fields(email = %payload.email))]
pub async fn register(
    Extension(store): Extension<DynStore>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email address".to_string()));
    }
    if payload.password.len() < MIN_PASSWORD_LENGTH {
        return Err(ApiError::Validation(
            "Password must be at least 6 characters".to_string(),
        ));
    }

    let password_hash = password::hash(&payload.password)?;

    // The store resolves duplicate emails atomically; two concurrent
    // registrations for the same address cannot both succeed.
    let user = store
        .insert_user(NewUser {
            email: payload.email,
            password_hash,
            full_name: payload.full_name,
            is_active: true,
            is_superuser: false,
        })
        .await?;

    debug!("registered user {}", user.id);
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Access and refresh tokens", body = TokenResponse),
        (status = 401, description = "Incorrect email or password"),
        (status = 400, description = "Inactive user"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn login(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
    Form(form): Form<LoginForm>,
) -> Result<Json<TokenResponse>, ApiError> {
    // One rejection path for unknown email and wrong password; the response
    // must not reveal which factor failed.
    let user = match store.user_by_email(&form.username).await? {
        Some(user) if password::verify(&form.password, &user.password_hash) => user,
        _ => return Err(ApiError::Unauthorized("Incorrect email or password")),
    };

    if !user.is_active {
        return Err(ApiError::InactiveAccount);
    }

    let pair = state
        .codec()
        .issue_pair(&user.email, unix_now())
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(TokenResponse::from(pair)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "New access and refresh tokens", body = TokenResponse),
        (status = 401, description = "Invalid, expired, or wrong-type token"),
        (status = 404, description = "User no longer exists"),
        (status = 400, description = "Inactive user"),
    ),
    tag = "auth"
)]
#[instrument(skip_all)]
pub async fn refresh(
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let claims = state
        .codec()
        .decode(&payload.refresh_token, unix_now())
        .map_err(|_| ApiError::Unauthorized("Invalid refresh token"))?;

    if claims.kind != TokenKind::Refresh {
        return Err(ApiError::Unauthorized(
            "Invalid token type. Refresh token required.",
        ));
    }

    let user = store
        .user_by_email(&claims.sub)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    if !user.is_active {
        return Err(ApiError::InactiveAccount);
    }

    // A fresh pair every time. The presented refresh token is not invalidated;
    // there is no revocation store.
    let pair = state
        .codec()
        .issue_pair(&user.email, unix_now())
        .map_err(|err| ApiError::Internal(err.to_string()))?;

    Ok(Json(TokenResponse::from(pair)))
}

#[utoipa::path(
    post,
    path = "/api/v1/auth/test-token",
    responses(
        (status = 200, description = "Current user for a valid access token", body = UserResponse),
        (status = 401, description = "Missing or invalid access token"),
    ),
    security(("bearer" = [])),
    tag = "auth"
)]
pub async fn test_token(
    headers: HeaderMap,
    Extension(state): Extension<Arc<AuthState>>,
    Extension(store): Extension<DynStore>,
) -> Result<Json<UserResponse>, ApiError> {
    let user = require_user(&headers, &state, &store).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Hash an updated password into [`UserChanges`], validating length first.
pub(super) fn password_change(
    changes: &mut UserChanges,
    password: Option<String>,
) -> Result<(), ApiError> {
    if let Some(password) = password {
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(ApiError::Validation(
                "Password must be at least 6 characters".to_string(),
            ));
        }
        changes.password_hash = Some(password::hash(&password)?);
    }
    Ok(())
}
