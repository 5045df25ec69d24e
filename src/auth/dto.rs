use serde::{Deserialize, Serialize};

use super::{
    jwt::{IssuedToken, TokenPair},
    session::{AuthSession, Credentials, SignUp},
};
use crate::users::repo_types::PublicUser;

/// Request body for sign-up. Fields are optional so that a missing one is
/// reported as a validation error rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignUpRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "remember_me")]
    pub remember_me: Option<bool>,
}

impl From<SignUpRequest> for SignUp {
    fn from(r: SignUpRequest) -> Self {
        Self {
            username: r.username,
            email: r.email,
            password: r.password,
            remember_me: r.remember_me,
        }
    }
}

/// Request body for sign-in and sign-in-or-create.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInRequest {
    pub email: Option<String>,
    pub password: Option<String>,
    #[serde(alias = "remember_me")]
    pub remember_me: Option<bool>,
}

impl From<SignInRequest> for Credentials {
    fn from(r: SignInRequest) -> Self {
        Self {
            email: r.email,
            password: r.password,
            remember_me: r.remember_me,
        }
    }
}

/// Request body for token refresh. The cookie is used when absent.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshRequest {
    #[serde(alias = "refreshToken")]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[serde(alias = "old_password")]
    pub old_password: Option<String>,
    #[serde(alias = "new_password")]
    pub new_password: Option<String>,
}

/// Response returned after sign-up or sign-in.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub user: PublicUser,
    pub tokens: TokenPair,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_new_user: Option<bool>,
}

impl AuthResponse {
    pub fn new(session: AuthSession, is_new_user: Option<bool>) -> Self {
        Self {
            user: session.user,
            tokens: session.tokens,
            is_new_user,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access: IssuedToken,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_camel_and_snake_case_remember_me() {
        let camel: SignInRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"x","rememberMe":true}"#).unwrap();
        let snake: SignInRequest =
            serde_json::from_str(r#"{"email":"a@b.co","password":"x","remember_me":true}"#).unwrap();
        assert_eq!(camel.remember_me, Some(true));
        assert_eq!(snake.remember_me, Some(true));
    }

    #[test]
    fn missing_fields_deserialize_as_none() {
        let req: SignUpRequest = serde_json::from_str("{}").unwrap();
        assert!(req.email.is_none());
        assert!(req.password.is_none());
    }
}
