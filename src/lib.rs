//! # Tessera
//!
//! `tessera` is a username/password authentication service issuing
//! short-lived access tokens and longer-lived refresh tokens, with
//! ownership-checked CRUD over users and their items.
//!
//! ## Authentication
//!
//! Registration creates an active, non-superuser account. Login returns an
//! access/refresh token pair (JWT, HS256, one process-wide secret); every
//! protected endpoint re-derives the caller's identity from the presented
//! access token, so no session state lives in the process.
//!
//! ## Authorization
//!
//! One rule everywhere: the resource owner or a superuser may act, everyone
//! else is rejected. Item reads are public; item writes, user reads, and user
//! writes require a bearer token, and listing all users requires a superuser.
//!
//! ## Known limitation
//!
//! Refresh tokens are not tracked server-side. Using one does not invalidate
//! it and neither does a password change; a leaked refresh token stays valid
//! until its natural expiry.

pub mod api;
pub mod cli;
pub mod password;
pub mod store;
pub mod token;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_commit_hash_format() {
        if GIT_COMMIT_HASH == "unknown" {
            // Acceptable in non-git build environments
            return;
        }
        // Should be a hex string (full SHA-1 is 40 chars, but could be short)
        assert!(
            GIT_COMMIT_HASH.chars().all(|c| c.is_ascii_hexdigit()),
            "GIT_COMMIT_HASH should be a hex string, got: {GIT_COMMIT_HASH}"
        );
        assert!(
            GIT_COMMIT_HASH.len() >= 7,
            "GIT_COMMIT_HASH should be at least 7 characters long, got: {GIT_COMMIT_HASH}"
        );
    }
}
