//! Field-level input validation shared by the auth, notes and account services.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

use crate::error::ApiError;

static USERNAME_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[a-zA-Z0-9_-]{3,30}$").expect("valid regex"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid regex"));
static COLOR_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#[0-9A-Fa-f]{6}$").expect("valid regex"));

pub const USERNAME_MESSAGE: &str =
    "Username must be 3-30 characters and contain only letters, numbers, underscores, and hyphens";
pub const EMAIL_MESSAGE: &str = "Please provide a valid email address";
pub const EMAIL_MAX_LEN: usize = 255;
pub const PASSWORD_MIN_LEN: usize = 8;
pub const PASSWORD_MAX_LEN: usize = 100;
pub const TITLE_MAX_LEN: usize = 200;
pub const CONTENT_MAX_LEN: usize = 10_000;
pub const CATEGORY_MAX_LEN: usize = 50;
pub const SEARCH_MAX_LEN: usize = 100;

pub fn is_valid_username(username: &str) -> bool {
    USERNAME_RE.is_match(username)
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= EMAIL_MAX_LEN && EMAIL_RE.is_match(email)
}

pub fn is_valid_color(color: &str) -> bool {
    COLOR_RE.is_match(color)
}

/// Lengths are counted in characters, not bytes
pub fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Collects per-field messages; the first message for a field wins.
#[derive(Debug, Default)]
pub struct Validator {
    errors: HashMap<String, String>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&mut self, field: &str, message: impl Into<String>) {
        self.errors.entry(field.to_string()).or_insert_with(|| message.into());
    }

    pub fn check(&mut self, field: &str, ok: bool, message: impl Into<String>) {
        if !ok {
            self.fail(field, message);
        }
    }

    /// Records a failure if the value is missing and passes it through otherwise
    pub fn required<'a>(&mut self, field: &str, value: Option<&'a str>, message: &str) -> Option<&'a str> {
        if value.is_none() {
            self.fail(field, message);
        }
        value
    }

    pub fn finish(self) -> Result<(), ApiError> {
        if self.errors.is_empty() {
            return Ok(());
        }
        let message = if self.errors.len() == 1 {
            self.errors.values().next().cloned().unwrap_or_default()
        } else {
            "Validation failed".to_string()
        };
        Err(ApiError::validation_error(message, Some(self.errors)))
    }
}

/// Trim and map blank strings to None
pub fn trimmed(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|s| !s.is_empty()).map(str::to_string)
}
