//! Password hashing (Argon2id, PHC string format).
//!
//! Hashes are opaque to the rest of the service: they are stored verbatim and
//! only ever fed back into [`verify`].

use anyhow::{Context, Result, anyhow};
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand::{RngCore, rngs::OsRng};

/// Hash a plaintext password with a fresh random salt.
///
/// # Errors
///
/// Returns an error if salt generation or hashing fails.
pub fn hash(password: &str) -> Result<String> {
    let mut salt_bytes = [0u8; 16];
    OsRng
        .try_fill_bytes(&mut salt_bytes)
        .context("failed to generate password salt")?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|err| anyhow!("failed to encode salt: {err}"))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| anyhow!("failed to hash password: {err}"))
}

/// Constant-time verification of a plaintext password against a stored hash.
///
/// An unparseable hash counts as a mismatch rather than an error so callers
/// cannot distinguish corrupt records from wrong passwords.
#[must_use]
pub fn verify(password: &str, password_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(password_hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_then_verify_round_trip() -> Result<()> {
        let hashed = hash("correct horse battery staple")?;
        assert!(verify("correct horse battery staple", &hashed));
        assert!(!verify("wrong password", &hashed));
        Ok(())
    }

    #[test]
    fn hash_never_contains_plaintext() -> Result<()> {
        let hashed = hash("hunter2secret")?;
        assert!(!hashed.contains("hunter2secret"));
        assert!(hashed.starts_with("$argon2"));
        Ok(())
    }

    #[test]
    fn same_password_hashes_differently_per_salt() -> Result<()> {
        let first = hash("secret1")?;
        let second = hash("secret1")?;
        assert_ne!(first, second);
        assert!(verify("secret1", &first));
        assert!(verify("secret1", &second));
        Ok(())
    }

    #[test]
    fn verify_rejects_garbage_hash() {
        assert!(!verify("anything", "not-a-phc-string"));
    }
}
