use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use tracing::warn;
use uuid::Uuid;

use super::{claims::TokenPurpose, cookies, jwt::TokenIssuer};
use crate::error::AppError;

/// Id of the caller, resolved from a verified access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUser(pub Uuid);

/// `Authorization: Bearer` wins over the `access_token` cookie.
fn bearer_or_cookie(parts: &Parts) -> Option<&str> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|auth| {
            auth.strip_prefix("Bearer ")
                .or_else(|| auth.strip_prefix("bearer "))
        })
        .map(str::trim)
        .filter(|t| !t.is_empty());
    bearer.or_else(|| cookies::read_cookie(&parts.headers, cookies::ACCESS_COOKIE))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    TokenIssuer: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = bearer_or_cookie(parts)
            .ok_or_else(|| AppError::unauthorized("Unauthorized access, no token provided"))?;

        let issuer = TokenIssuer::from_ref(state);
        let claims = issuer
            .verify_purpose(token, TokenPurpose::Access)
            .map_err(|e| {
                warn!(error = %e, "access token rejected");
                AppError::unauthorized("Invalid or expired token")
            })?;

        Ok(AuthUser(claims.sub))
    }
}

/// Same as [`AuthUser`] but never rejects.
#[derive(Debug, Clone, Copy)]
pub struct MaybeAuthUser(pub Option<Uuid>);

#[async_trait]
impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    TokenIssuer: FromRef<S>,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeAuthUser(
            AuthUser::from_request_parts(parts, state)
                .await
                .ok()
                .map(|AuthUser(id)| id),
        ))
    }
}
