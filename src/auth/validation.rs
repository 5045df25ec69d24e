use lazy_static::lazy_static;
use regex::Regex;
use uuid::Uuid;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;
pub const USERNAME_LEN: std::ops::RangeInclusive<usize> = 2..=30;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Trims and lowercases; emails are compared case-insensitively everywhere.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Pulls a required email out of a request, normalised and shape-checked.
pub fn required_email(raw: Option<&str>) -> Result<String, AppError> {
    let email = raw
        .map(normalize_email)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::validation("Email and password are required"))?;
    if !is_valid_email(&email) {
        return Err(AppError::validation("Please enter a valid email address"));
    }
    Ok(email)
}

pub fn required_password(raw: Option<&str>) -> Result<&str, AppError> {
    raw.filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::validation("Email and password are required"))
}

pub fn check_new_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

pub fn check_username(raw: &str) -> Result<String, AppError> {
    let name = raw.trim();
    if !USERNAME_LEN.contains(&name.chars().count()) {
        return Err(AppError::validation(format!(
            "Username must be between {} and {} characters",
            USERNAME_LEN.start(),
            USERNAME_LEN.end()
        )));
    }
    Ok(name.to_string())
}

/// Username from the email local part. Too-short local parts fall back to a
/// name built from the user id.
pub fn derive_username(email: &str, id: Uuid) -> String {
    let local: String = email
        .split('@')
        .next()
        .unwrap_or_default()
        .chars()
        .take(*USERNAME_LEN.end())
        .collect();
    if local.chars().count() < *USERNAME_LEN.start() {
        let simple = id.simple().to_string();
        return format!("user-{}", &simple[..8]);
    }
    local
}
