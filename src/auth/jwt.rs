use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use super::claims::{Claims, TokenPurpose};
use crate::config::{ConfigError, JwtConfig};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token is invalid")]
    Invalid,
    #[error("token has expired")]
    Expired,
    #[error("token has the wrong purpose")]
    WrongPurpose,
    #[error("token signing failed: {0}")]
    Signing(String),
}

/// A freshly minted token and when it stops being valid.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedToken {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(skip)]
    pub ttl: Duration,
}

/// Access and refresh token minted together on sign-up/sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access: IssuedToken,
    pub refresh: IssuedToken,
}

/// Signs and verifies bearer tokens with the process-wide HS256 secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenIssuer {
    /// Refuses to build without a secret, so nothing downstream can run
    /// unsigned.
    pub fn new(cfg: &JwtConfig) -> Result<Self, ConfigError> {
        if cfg.secret.trim().is_empty() {
            return Err(ConfigError::MissingVar("JWT_SECRET".into()));
        }
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            access_ttl: Duration::minutes(cfg.access_ttl_minutes),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes),
        })
    }

    pub fn issue(
        &self,
        subject: Uuid,
        purpose: TokenPurpose,
        ttl: Duration,
    ) -> Result<IssuedToken, TokenError> {
        let now = OffsetDateTime::now_utc();
        let expires_at = now + ttl;
        let claims = Claims {
            sub: subject,
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            purpose,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))?;
        debug!(user_id = %subject, purpose = ?purpose, "jwt signed");
        Ok(IssuedToken {
            token,
            expires_at,
            ttl,
        })
    }

    pub fn issue_access(&self, subject: Uuid) -> Result<IssuedToken, TokenError> {
        self.issue(subject, TokenPurpose::Access, self.access_ttl)
    }

    pub fn issue_pair(&self, subject: Uuid) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access: self.issue_access(subject)?,
            refresh: self.issue(subject, TokenPurpose::Refresh, self.refresh_ttl)?,
        })
    }

    /// Checks signature, issuer and audience, then expiry. A token is
    /// expired once `now >= exp`; there is no leeway.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.validate_exp = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        if OffsetDateTime::now_utc().unix_timestamp() >= data.claims.exp {
            return Err(TokenError::Expired);
        }
        debug!(user_id = %data.claims.sub, purpose = ?data.claims.purpose, "jwt verified");
        Ok(data.claims)
    }

    pub fn verify_purpose(&self, token: &str, purpose: TokenPurpose) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.purpose != purpose {
            return Err(TokenError::WrongPurpose);
        }
        Ok(claims)
    }
}

#[cfg(test)]
pub(crate) fn test_jwt_config(secret: &str) -> JwtConfig {
    JwtConfig {
        secret: secret.into(),
        issuer: "test-issuer".into(),
        audience: "test-aud".into(),
        access_ttl_minutes: 15,
        refresh_ttl_minutes: 60 * 24 * 7,
    }
}
