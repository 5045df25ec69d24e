use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Gamification snapshot kept on the user row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Gamification {
    pub xp: i64,
    pub level: i64,
    pub coins: i64,
    pub streak_count: i64,
}

impl Default for Gamification {
    fn default() -> Self {
        Self {
            xp: 0,
            level: 1,
            coins: 0,
            streak_count: 0,
        }
    }
}

/// 100 xp per level, starting at level 1.
pub fn level_for_xp(xp: i64) -> i64 {
    1 + xp.max(0) / 100
}

impl Gamification {
    /// Applies signed deltas. Totals never drop below zero and the level
    /// follows xp. `users::repo::adjust_gamification` does the same in SQL.
    pub fn apply(self, xp_delta: i64, coins_delta: i64) -> Self {
        let xp = (self.xp + xp_delta).max(0);
        Self {
            xp,
            level: level_for_xp(xp),
            coins: (self.coins + coins_delta).max(0),
            streak_count: self.streak_count,
        }
    }
}

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String, // argon2 PHC string, never leaves the server
    pub remember_me: Option<bool>,
    #[sqlx(flatten)]
    pub gamification: Gamification,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Everything needed to insert a user. The id is generated up front.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub remember_me: Option<bool>,
}

/// Profile fields a user may change about themselves.
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Public part of the user returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remember_me: Option<bool>,
    pub gamification: Gamification,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            remember_me: u.remember_me,
            gamification: u.gamification,
            created_at: u.created_at,
            updated_at: u.updated_at,
        }
    }
}
