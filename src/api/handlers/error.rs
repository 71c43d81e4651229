//! Error kinds returned by handlers and their transport mapping.
//!
//! Handlers return `Result<_, ApiError>`; this boundary is the only place an
//! error kind becomes an HTTP status. Backend failures are logged here and
//! surfaced as a generic 500 so internals never leak to clients.

use axum::{
    http::{StatusCode, header::WWW_AUTHENTICATE},
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    /// Input shape or constraint violated.
    Validation(String),
    /// Duplicate unique key. Mapped to 400, matching the register contract.
    Conflict(&'static str),
    /// Missing, invalid, expired, or wrong-type credential.
    Unauthorized(&'static str),
    /// Authenticated but not permitted.
    Forbidden(&'static str),
    NotFound(&'static str),
    /// Valid credential for a disabled account.
    InactiveAccount,
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Validation(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Conflict(message) => (StatusCode::BAD_REQUEST, message).into_response(),
            Self::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                [(WWW_AUTHENTICATE, "Bearer")],
                message,
            )
                .into_response(),
            Self::Forbidden(message) => (StatusCode::FORBIDDEN, message).into_response(),
            Self::NotFound(message) => (StatusCode::NOT_FOUND, message).into_response(),
            Self::InactiveAccount => (StatusCode::BAD_REQUEST, "Inactive user").into_response(),
            Self::Internal(detail) => {
                error!("Request failed: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            // Email is the only unique key in the store.
            StoreError::Conflict(_) => Self::Conflict("A user with this email already exists"),
            StoreError::MissingOwner(owner_id) => {
                Self::Internal(format!("item owner {owner_id} does not exist"))
            }
            StoreError::Backend(detail) => Self::Internal(detail),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(format!("{err:#}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (ApiError::Validation("bad".to_string()), StatusCode::BAD_REQUEST),
            (ApiError::Conflict("dup"), StatusCode::BAD_REQUEST),
            (ApiError::Unauthorized("no"), StatusCode::UNAUTHORIZED),
            (ApiError::Forbidden("denied"), StatusCode::FORBIDDEN),
            (ApiError::NotFound("missing"), StatusCode::NOT_FOUND),
            (ApiError::InactiveAccount, StatusCode::BAD_REQUEST),
            (
                ApiError::Internal("boom".to_string()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.into_response().status(), expected);
        }
    }

    #[test]
    fn unauthorized_carries_bearer_challenge() {
        let response = ApiError::Unauthorized("nope").into_response();
        assert_eq!(
            response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|value| value.to_str().ok()),
            Some("Bearer")
        );
    }

    #[test]
    fn store_conflict_maps_to_duplicate_email() {
        let err = ApiError::from(StoreError::Conflict("email"));
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}
