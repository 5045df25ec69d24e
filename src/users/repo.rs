use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::repo_types::{Gamification, NewUser, ProfileChanges, User};
use crate::db::{bounded, Database, StoreResult};

const USER_COLUMNS: &str = "id, username, email, password_hash, remember_me, \
     xp, level, coins, streak_count, created_at, updated_at";

/// Credential store. Email uniqueness is enforced by the implementation and
/// reported as `StoreError::Conflict`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn list(&self) -> StoreResult<Vec<User>>;
    /// Opens a unit of work for user creation.
    async fn begin(&self) -> StoreResult<Box<dyn UserTx>>;
    async fn set_remember_me(&self, id: Uuid, remember_me: bool) -> StoreResult<()>;
    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()>;
    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> StoreResult<Option<User>>;
}

/// Writes staged here become visible on `commit` and vanish on `rollback`.
#[async_trait]
pub trait UserTx: Send {
    async fn create_user(&mut self, new_user: &NewUser) -> StoreResult<User>;
    async fn commit(self: Box<Self>) -> StoreResult<()>;
    async fn rollback(self: Box<Self>) -> StoreResult<()>;
}

#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgUserStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool.clone(),
            timeout: db.timeout,
        }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        bounded(
            self.timeout,
            sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool),
        )
        .await
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        bounded(
            self.timeout,
            sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(&self.pool),
        )
        .await
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        bounded(self.timeout, sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool)).await
    }

    async fn begin(&self) -> StoreResult<Box<dyn UserTx>> {
        let tx = bounded(self.timeout, self.pool.begin()).await?;
        Ok(Box::new(PgUserTx {
            tx,
            timeout: self.timeout,
        }))
    }

    async fn set_remember_me(&self, id: Uuid, remember_me: bool) -> StoreResult<()> {
        bounded(
            self.timeout,
            sqlx::query("UPDATE users SET remember_me = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(remember_me)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn set_password_hash(&self, id: Uuid, password_hash: &str) -> StoreResult<()> {
        bounded(
            self.timeout,
            sqlx::query("UPDATE users SET password_hash = $2, updated_at = now() WHERE id = $1")
                .bind(id)
                .bind(password_hash)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, changes: &ProfileChanges) -> StoreResult<Option<User>> {
        let sql = format!(
            r#"
            UPDATE users
               SET username = COALESCE($2, username),
                   email = COALESCE($3, email),
                   updated_at = now()
             WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        bounded(
            self.timeout,
            sqlx::query_as::<_, User>(&sql)
                .bind(id)
                .bind(changes.username.as_deref())
                .bind(changes.email.as_deref())
                .fetch_optional(&self.pool),
        )
        .await
    }
}

pub struct PgUserTx {
    tx: Transaction<'static, Postgres>,
    timeout: Duration,
}

#[async_trait]
impl UserTx for PgUserTx {
    async fn create_user(&mut self, new_user: &NewUser) -> StoreResult<User> {
        let sql = format!(
            r#"
            INSERT INTO users (id, username, email, password_hash, remember_me)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        bounded(
            self.timeout,
            sqlx::query_as::<_, User>(&sql)
                .bind(new_user.id)
                .bind(&new_user.username)
                .bind(&new_user.email)
                .bind(&new_user.password_hash)
                .bind(new_user.remember_me)
                .fetch_one(&mut *self.tx),
        )
        .await
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let PgUserTx { tx, timeout } = *self;
        bounded(timeout, tx.commit()).await
    }

    async fn rollback(self: Box<Self>) -> StoreResult<()> {
        let PgUserTx { tx, timeout } = *self;
        bounded(timeout, tx.rollback()).await
    }
}

/// Locks the user's snapshot for the rest of the transaction.
pub async fn lock_gamification(
    conn: &mut PgConnection,
    user_id: Uuid,
) -> Result<Option<Gamification>, sqlx::Error> {
    sqlx::query_as::<_, Gamification>(
        "SELECT xp, level, coins, streak_count FROM users WHERE id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

/// SQL twin of [`Gamification::apply`], meant to run inside the same
/// transaction as the ledger entries it mirrors.
pub async fn adjust_gamification(
    conn: &mut PgConnection,
    user_id: Uuid,
    xp_delta: i64,
    coins_delta: i64,
) -> Result<Option<Gamification>, sqlx::Error> {
    sqlx::query_as::<_, Gamification>(
        r#"
        UPDATE users
           SET xp = GREATEST(xp + $2, 0),
               level = 1 + GREATEST(xp + $2, 0) / 100,
               coins = GREATEST(coins + $3, 0),
               updated_at = now()
         WHERE id = $1
        RETURNING xp, level, coins, streak_count
        "#,
    )
    .bind(user_id)
    .bind(xp_delta)
    .bind(coins_delta)
    .fetch_optional(conn)
    .await
}
