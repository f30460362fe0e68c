//! Input validation helpers

use regex::Regex;
use std::sync::LazyLock;

/// Minimum password length for registration and password change
pub const MIN_PASSWORD_LENGTH: usize = 6;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email regex is valid")
});

/// Check for a `local@domain.tld` shape
pub fn is_valid_email(email: &str) -> bool {
    EMAIL_RE.is_match(email)
}

/// Trimmed value, or `None` when absent or blank
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Lower-cased, trimmed email used for storage and lookup
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Whether a password meets the minimum length
pub fn password_long_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LENGTH
}
