//! Route handlers and shared request helpers.

pub mod auth;
pub mod error;
pub mod health;
pub mod items;
pub mod root;
pub mod users;

use regex::Regex;
use serde::Deserialize;
use utoipa::IntoParams;

use crate::store::Page;

/// Lightweight email sanity check used before persisting data.
pub fn valid_email(email: &str) -> bool {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").is_ok_and(|re| re.is_match(email))
}

/// Skip/limit query parameters shared by list endpoints.
#[derive(Debug, Deserialize, IntoParams)]
pub struct Pagination {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_limit() -> i64 {
    100
}

impl Pagination {
    pub(crate) fn page(&self) -> Page {
        Page::new(self.skip, self.limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_email_accepts_basic_format() {
        assert!(valid_email("a@example.com"));
        assert!(valid_email("name.surname@example.co"));
    }

    #[test]
    fn valid_email_rejects_missing_parts() {
        assert!(!valid_email("not-an-email"));
        assert!(!valid_email("missing-at.example.com"));
        assert!(!valid_email("missing-domain@"));
        assert!(!valid_email("spaces in@example.com"));
    }

    #[test]
    fn pagination_defaults_apply() {
        let pagination: Pagination = serde_json::from_str("{}").expect("empty query");
        assert_eq!(pagination.skip, 0);
        assert_eq!(pagination.limit, 100);
    }
}
