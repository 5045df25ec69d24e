use serde::Deserialize;

use super::repo_types::ProfileChanges;
use crate::{
    auth::validation::{check_username, is_valid_email, normalize_email},
    error::AppError,
};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
}

impl UpdateProfileRequest {
    pub fn validate(self) -> Result<ProfileChanges, AppError> {
        let username = self.username.as_deref().map(check_username).transpose()?;
        let email = match self.email.as_deref() {
            Some(raw) => {
                let email = normalize_email(raw);
                if !is_valid_email(&email) {
                    return Err(AppError::validation("Please enter a valid email address"));
                }
                Some(email)
            }
            None => None,
        };
        if username.is_none() && email.is_none() {
            return Err(AppError::validation("Nothing to update"));
        }
        Ok(ProfileChanges { username, email })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_email() {
        let changes = UpdateProfileRequest {
            email: Some("  Ada@Example.COM ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(changes.email.as_deref(), Some("ada@example.com"));
        assert!(changes.username.is_none());
    }

    #[test]
    fn rejects_bad_fields_and_empty_body() {
        assert!(UpdateProfileRequest {
            email: Some("not-an-email".into()),
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(UpdateProfileRequest {
            username: Some("a".into()),
            ..Default::default()
        }
        .validate()
        .is_err());
        assert!(UpdateProfileRequest::default().validate().is_err());
    }
}
