//! Request/response types for auth and user endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::UserRecord;
use crate::token::TokenPair;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: Option<String>,
}

/// OAuth2-style password form: `username` carries the email.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: String,
}

impl From<TokenPair> for TokenResponse {
    fn from(pair: TokenPair) -> Self {
        Self {
            access_token: pair.access,
            refresh_token: pair.refresh,
            token_type: "bearer".to_string(),
        }
    }
}

/// Public view of a user. The password hash never appears here.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            full_name: user.full_name,
            is_active: user.is_active,
            is_superuser: user.is_superuser,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug, Default)]
pub struct UserUpdateRequest {
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub password: Option<String>,
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;
    use chrono::TimeZone;

    fn user_record() -> UserRecord {
        UserRecord {
            id: 1,
            email: "alice@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            full_name: Some("Alice".to_string()),
            is_active: true,
            is_superuser: false,
            created_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            updated_at: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
        }
    }

    #[test]
    fn user_response_never_exposes_password_hash() -> Result<()> {
        let response = UserResponse::from(user_record());
        let value = serde_json::to_value(&response)?;

        assert!(value.get("password_hash").is_none());
        assert!(value.get("hashed_password").is_none());
        assert!(!value.to_string().contains("argon2"));
        assert_eq!(
            value.get("email").and_then(serde_json::Value::as_str),
            Some("alice@example.com")
        );
        Ok(())
    }

    #[test]
    fn token_response_labels_bearer() {
        let response = TokenResponse::from(TokenPair {
            access: "a".to_string(),
            refresh: "r".to_string(),
        });
        assert_eq!(response.token_type, "bearer");
        assert_ne!(response.access_token, response.refresh_token);
    }
}
