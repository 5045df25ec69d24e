use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What a token may be used for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    #[serde(alias = "Access")]
    Access,
    #[serde(alias = "Refresh")]
    Refresh,
}

/// JWT payload carried by both token purposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,             // user ID
    pub iat: i64,              // issued at (unix timestamp)
    pub exp: i64,              // expires at (unix timestamp)
    pub iss: String,           // issuer
    pub aud: String,           // audience
    pub purpose: TokenPurpose, // access or refresh
}
