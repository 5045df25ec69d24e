//! Sign-up, sign-in, refresh, sign-out and password change.
//!
//! Sessions are stateless: the only server-side record is the user row.
//! Signing out does not revoke anything, an issued token stays valid until
//! it expires.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::{
    claims::TokenPurpose,
    jwt::{IssuedToken, TokenIssuer, TokenPair},
    password::PasswordHasher,
    validation::{
        check_new_password, check_username, derive_username, required_email, required_password,
    },
};
use crate::{
    config::RememberMePolicy,
    db::StoreError,
    error::AppError,
    users::{
        repo::UserStore,
        repo_types::{NewUser, PublicUser, User},
    },
};

const EMAIL_TAKEN: &str = "User already exists with this email";

#[derive(Debug, Clone, Default)]
pub struct SignUp {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub remember_me: Option<bool>,
}

#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub email: Option<String>,
    pub password: Option<String>,
    pub remember_me: Option<bool>,
}

/// Result of a successful sign-up or sign-in.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub user: PublicUser,
    pub tokens: TokenPair,
    /// Whether the client should keep the credentials beyond the browser
    /// session.
    #[serde(skip)]
    pub persistent: bool,
}

#[derive(Debug, Clone)]
pub struct RefreshedAccess {
    pub user_id: Uuid,
    pub access: IssuedToken,
    pub persistent: bool,
}

#[derive(Clone)]
pub struct SessionManager {
    users: Arc<dyn UserStore>,
    hasher: PasswordHasher,
    tokens: TokenIssuer,
    remember_me: RememberMePolicy,
}

impl SessionManager {
    pub fn new(
        users: Arc<dyn UserStore>,
        hasher: PasswordHasher,
        tokens: TokenIssuer,
        remember_me: RememberMePolicy,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            remember_me,
        }
    }

    pub async fn sign_up(&self, input: SignUp) -> Result<AuthSession, AppError> {
        let email = required_email(input.email.as_deref())?;
        let password = required_password(input.password.as_deref())?;
        check_new_password(password)?;
        let id = Uuid::new_v4();
        let username = match input.username.as_deref() {
            Some(name) => check_username(name)?,
            None => derive_username(&email, id),
        };

        if self.users.find_by_email(&email).await?.is_some() {
            warn!(email = %email, "email already registered");
            return Err(AppError::Conflict(EMAIL_TAKEN.into()));
        }

        self.create_account(NewUser {
            id,
            username,
            email,
            password_hash: self.hasher.hash(password)?,
            remember_me: input.remember_me,
        })
        .await
    }

    pub async fn sign_in(&self, input: Credentials) -> Result<AuthSession, AppError> {
        let email = required_email(input.email.as_deref())?;
        let password = required_password(input.password.as_deref())?;

        let Some(user) = self.users.find_by_email(&email).await? else {
            self.hasher.verify_decoy(password);
            warn!(email = %email, "sign-in unknown email");
            return Err(AppError::invalid_credentials());
        };
        self.check_password(&user, password)?;
        self.finish_sign_in(user, input.remember_me).await
    }

    /// Signs in when the email is known, otherwise registers it. The flag is
    /// true when a new user was created.
    pub async fn sign_in_or_create(
        &self,
        input: Credentials,
    ) -> Result<(AuthSession, bool), AppError> {
        let email = required_email(input.email.as_deref())?;
        let password = required_password(input.password.as_deref())?;

        if let Some(user) = self.users.find_by_email(&email).await? {
            self.check_password(&user, password)?;
            let session = self.finish_sign_in(user, input.remember_me).await?;
            return Ok((session, false));
        }

        check_new_password(password)?;
        let id = Uuid::new_v4();
        let session = self
            .create_account(NewUser {
                id,
                username: derive_username(&email, id),
                email,
                password_hash: self.hasher.hash(password)?,
                remember_me: input.remember_me,
            })
            .await?;
        Ok((session, true))
    }

    /// Mints a new access token from a refresh token. The refresh token
    /// itself is not rotated.
    pub async fn refresh(&self, refresh_token: Option<&str>) -> Result<RefreshedAccess, AppError> {
        let token = refresh_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("Refresh token missing"))?;

        let claims = self
            .tokens
            .verify_purpose(token, TokenPurpose::Refresh)
            .map_err(|e| {
                warn!(error = %e, "refresh token rejected");
                AppError::unauthorized("Invalid or expired refresh token")
            })?;

        let Some(user) = self.users.find_by_id(claims.sub).await? else {
            warn!(user_id = %claims.sub, "refresh for missing user");
            return Err(AppError::unauthorized("User not found"));
        };

        let access = self.tokens.issue_access(user.id)?;
        let persistent = match self.remember_me {
            RememberMePolicy::Ignore => true,
            RememberMePolicy::Honor => user.remember_me.unwrap_or(false),
        };
        info!(user_id = %user.id, "access token refreshed");
        Ok(RefreshedAccess {
            user_id: user.id,
            access,
            persistent,
        })
    }

    /// Nothing to undo server-side; the caller drops both credentials.
    pub fn sign_out(&self, user_id: Option<Uuid>) {
        match user_id {
            Some(id) => info!(user_id = %id, "user signed out"),
            None => info!("anonymous sign-out"),
        }
    }

    /// Outstanding tokens stay valid after a password change.
    pub async fn change_password(
        &self,
        user_id: Uuid,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), AppError> {
        let (Some(old), Some(new)) = (
            old_password.filter(|p| !p.is_empty()),
            new_password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::validation("Old and new password are required"));
        };
        check_new_password(new)?;

        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found("User not found"))?;
        self.check_password(&user, old)?;

        let hash = self.hasher.hash(new)?;
        self.users.set_password_hash(user.id, &hash).await?;
        info!(user_id = %user.id, "password changed");
        Ok(())
    }

    /// A wrong password and an unparseable stored hash are kept apart: the
    /// first is the user's fault, the second is ours.
    fn check_password(&self, user: &User, password: &str) -> Result<(), AppError> {
        match self.hasher.verify(password, &user.password_hash) {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(user_id = %user.id, "invalid password");
                Err(AppError::invalid_credentials())
            }
            Err(e) => {
                error!(error = %e, user_id = %user.id, "stored password hash unusable");
                Err(e.into())
            }
        }
    }

    async fn finish_sign_in(
        &self,
        mut user: User,
        remember_me: Option<bool>,
    ) -> Result<AuthSession, AppError> {
        if let Some(flag) = remember_me {
            if user.remember_me != Some(flag) {
                self.users.set_remember_me(user.id, flag).await?;
                user.remember_me = Some(flag);
            }
        }
        let tokens = self.tokens.issue_pair(user.id)?;
        info!(user_id = %user.id, email = %user.email, "user signed in");
        Ok(AuthSession {
            persistent: user.remember_me.unwrap_or(false),
            user: user.into(),
            tokens,
        })
    }

    /// Creates the user and its tokens as one unit: nothing is committed
    /// unless both succeed.
    async fn create_account(&self, new_user: NewUser) -> Result<AuthSession, AppError> {
        let mut tx = self.users.begin().await?;

        let user = match tx.create_user(&new_user).await {
            Ok(user) => user,
            Err(e) => {
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback after failed insert");
                }
                return Err(creation_error(e));
            }
        };

        let tokens = match self.tokens.issue_pair(user.id) {
            Ok(tokens) => tokens,
            Err(e) => {
                error!(error = %e, user_id = %user.id, "token issuance failed, rolling back");
                if let Err(rb) = tx.rollback().await {
                    warn!(error = %rb, "rollback after failed token issuance");
                }
                return Err(e.into());
            }
        };

        tx.commit().await.map_err(creation_error)?;

        info!(user_id = %user.id, email = %user.email, "user registered");
        Ok(AuthSession {
            persistent: user.remember_me.unwrap_or(false),
            user: user.into(),
            tokens,
        })
    }
}

fn creation_error(e: StoreError) -> AppError {
    match e {
        StoreError::Conflict(_) => AppError::Conflict(EMAIL_TAKEN.into()),
        other => other.into(),
    }
}
