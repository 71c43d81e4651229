//! Bearer token extraction and identity resolution.
//!
//! Every protected operation passes through [`require_user`]: decode the
//! presented access token, resolve its subject to an active user, or fail
//! with the same unauthorized response for every cause.

use axum::http::{HeaderMap, header::AUTHORIZATION};

use crate::store::{DynStore, UserRecord};
use crate::token::{TokenKind, unix_now};

use super::super::error::ApiError;
use super::state::AuthState;

const CREDENTIALS_REJECTED: &str = "Could not validate credentials";

/// Resolve the `Authorization: Bearer` header into an active user.
///
/// # Errors
///
/// `Unauthorized` for a missing header, malformed/expired/forged token, a
/// token that is not of type `access`, an unknown subject, or an inactive
/// account. The message is identical across causes.
pub async fn require_user(
    headers: &HeaderMap,
    state: &AuthState,
    store: &DynStore,
) -> Result<UserRecord, ApiError> {
    let token =
        extract_bearer_token(headers).ok_or(ApiError::Unauthorized("Not authenticated"))?;

    let claims = state
        .codec()
        .decode(&token, unix_now())
        .map_err(|_| ApiError::Unauthorized(CREDENTIALS_REJECTED))?;

    if claims.kind != TokenKind::Access {
        return Err(ApiError::Unauthorized(CREDENTIALS_REJECTED));
    }

    let user = store
        .user_by_email(&claims.sub)
        .await?
        .ok_or(ApiError::Unauthorized(CREDENTIALS_REJECTED))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized(CREDENTIALS_REJECTED));
    }

    Ok(user)
}

pub(crate) fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn extracts_bearer_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc.def.ghi"));
        assert_eq!(
            extract_bearer_token(&headers),
            Some("abc.def.ghi".to_string())
        );
    }

    #[test]
    fn accepts_lowercase_scheme_and_padding() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("  bearer token  "));
        assert_eq!(extract_bearer_token(&headers), Some("token".to_string()));
    }

    #[test]
    fn rejects_missing_or_empty_tokens() {
        let headers = HeaderMap::new();
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert_eq!(extract_bearer_token(&headers), None);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));
        assert_eq!(extract_bearer_token(&headers), None);
    }
}
