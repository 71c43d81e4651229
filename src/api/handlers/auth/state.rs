//! Auth configuration and shared state.
//!
//! `AuthConfig` is built once at process start from CLI/environment values
//! and injected into handlers through `AuthState`; nothing here is a global.

use secrecy::{ExposeSecret, SecretString};

use crate::token::{Algorithm, TokenCodec};

const DEFAULT_ACCESS_TTL_MINUTES: i64 = 30;
const DEFAULT_REFRESH_TTL_DAYS: i64 = 7;
const DEFAULT_SUPERUSER_EMAIL: &str = "admin@example.com";
const DEFAULT_SUPERUSER_PASSWORD: &str = "admin123";

#[derive(Clone, Debug)]
pub struct AuthConfig {
    signing_secret: SecretString,
    algorithm: Algorithm,
    access_ttl_minutes: i64,
    refresh_ttl_days: i64,
    cors_origins: Vec<String>,
    superuser_email: String,
    superuser_password: SecretString,
}

impl AuthConfig {
    #[must_use]
    pub fn new(signing_secret: SecretString) -> Self {
        Self {
            signing_secret,
            algorithm: Algorithm::default(),
            access_ttl_minutes: DEFAULT_ACCESS_TTL_MINUTES,
            refresh_ttl_days: DEFAULT_REFRESH_TTL_DAYS,
            cors_origins: Vec::new(),
            superuser_email: DEFAULT_SUPERUSER_EMAIL.to_string(),
            superuser_password: SecretString::from(DEFAULT_SUPERUSER_PASSWORD.to_string()),
        }
    }

    #[must_use]
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    #[must_use]
    pub fn with_access_ttl_minutes(mut self, minutes: i64) -> Self {
        self.access_ttl_minutes = minutes;
        self
    }

    #[must_use]
    pub fn with_refresh_ttl_days(mut self, days: i64) -> Self {
        self.refresh_ttl_days = days;
        self
    }

    #[must_use]
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = origins;
        self
    }

    #[must_use]
    pub fn with_superuser_email(mut self, email: String) -> Self {
        self.superuser_email = email;
        self
    }

    #[must_use]
    pub fn with_superuser_password(mut self, password: SecretString) -> Self {
        self.superuser_password = password;
        self
    }

    #[must_use]
    pub fn access_ttl_seconds(&self) -> i64 {
        self.access_ttl_minutes * 60
    }

    #[must_use]
    pub fn refresh_ttl_seconds(&self) -> i64 {
        self.refresh_ttl_days * 24 * 60 * 60
    }

    #[must_use]
    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    #[must_use]
    pub fn superuser_email(&self) -> &str {
        &self.superuser_email
    }

    #[must_use]
    pub fn superuser_password(&self) -> &SecretString {
        &self.superuser_password
    }

    fn codec(&self) -> TokenCodec {
        TokenCodec::new(
            self.signing_secret.expose_secret().as_bytes().to_vec(),
            self.algorithm,
            self.access_ttl_seconds(),
            self.refresh_ttl_seconds(),
        )
    }
}

/// Per-process auth state shared by handlers via `Extension<Arc<AuthState>>`.
pub struct AuthState {
    config: AuthConfig,
    codec: TokenCodec,
}

impl AuthState {
    #[must_use]
    pub fn new(config: AuthConfig) -> Self {
        let codec = config.codec();
        Self { config, codec }
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_config_defaults_and_overrides() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()));

        assert_eq!(
            config.access_ttl_seconds(),
            DEFAULT_ACCESS_TTL_MINUTES * 60
        );
        assert_eq!(
            config.refresh_ttl_seconds(),
            DEFAULT_REFRESH_TTL_DAYS * 24 * 60 * 60
        );
        assert_eq!(config.superuser_email(), DEFAULT_SUPERUSER_EMAIL);
        assert!(config.cors_origins().is_empty());

        let config = config
            .with_access_ttl_minutes(5)
            .with_refresh_ttl_days(1)
            .with_cors_origins(vec!["https://app.tessera.dev".to_string()])
            .with_superuser_email("root@tessera.dev".to_string());

        assert_eq!(config.access_ttl_seconds(), 300);
        assert_eq!(config.refresh_ttl_seconds(), 86_400);
        assert_eq!(config.cors_origins().len(), 1);
        assert_eq!(config.superuser_email(), "root@tessera.dev");
    }

    #[test]
    fn state_builds_codec_from_config() {
        let config = AuthConfig::new(SecretString::from("secret".to_string()))
            .with_access_ttl_minutes(1);
        let state = AuthState::new(config);

        let now = 1_700_000_000;
        let token = state
            .codec()
            .issue("a@example.com", crate::token::TokenKind::Access, now)
            .expect("issue token");
        let claims = state.codec().decode(&token, now).expect("decode token");
        assert_eq!(claims.exp, now + 60);
    }
}
