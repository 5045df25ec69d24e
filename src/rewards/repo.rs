use sqlx::PgConnection;
use uuid::Uuid;

use super::repo_types::{NewReward, Reward, RewardChanges, RewardFilter};
use crate::db::{bounded, Database, StoreResult};

const REWARD_COLUMNS: &str = "id, user_id, title, description, cost, is_active, claimed, \
     claimed_at, created_at, updated_at";

pub async fn list_by_user(
    db: &Database,
    user_id: Uuid,
    filter: RewardFilter,
) -> StoreResult<Vec<Reward>> {
    let condition = match filter {
        RewardFilter::All => "",
        RewardFilter::Available => "AND is_active AND NOT claimed",
        RewardFilter::Claimed => "AND claimed",
    };
    let order = match filter {
        RewardFilter::Claimed => "claimed_at DESC",
        _ => "created_at DESC",
    };
    let sql = format!(
        "SELECT {REWARD_COLUMNS} FROM rewards WHERE user_id = $1 {condition} ORDER BY {order}"
    );
    bounded(
        db.timeout,
        sqlx::query_as::<_, Reward>(&sql)
            .bind(user_id)
            .fetch_all(&db.pool),
    )
    .await
}

pub async fn find(db: &Database, user_id: Uuid, id: Uuid) -> StoreResult<Option<Reward>> {
    let sql = format!("SELECT {REWARD_COLUMNS} FROM rewards WHERE id = $1 AND user_id = $2");
    bounded(
        db.timeout,
        sqlx::query_as::<_, Reward>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&db.pool),
    )
    .await
}

pub async fn insert(db: &Database, user_id: Uuid, reward: &NewReward) -> StoreResult<Reward> {
    let sql = format!(
        r#"
        INSERT INTO rewards (id, user_id, title, description, cost, is_active)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING {REWARD_COLUMNS}
        "#
    );
    bounded(
        db.timeout,
        sqlx::query_as::<_, Reward>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&reward.title)
            .bind(reward.description.as_deref())
            .bind(reward.cost)
            .bind(reward.is_active)
            .fetch_one(&db.pool),
    )
    .await
}

pub async fn update(
    db: &Database,
    user_id: Uuid,
    id: Uuid,
    changes: &RewardChanges,
) -> StoreResult<Option<Reward>> {
    let sql = format!(
        r#"
        UPDATE rewards
           SET title = COALESCE($3, title),
               description = COALESCE($4, description),
               cost = COALESCE($5, cost),
               is_active = COALESCE($6, is_active),
               updated_at = now()
         WHERE id = $1 AND user_id = $2
        RETURNING {REWARD_COLUMNS}
        "#
    );
    bounded(
        db.timeout,
        sqlx::query_as::<_, Reward>(&sql)
            .bind(id)
            .bind(user_id)
            .bind(changes.title.as_deref())
            .bind(changes.description.as_deref())
            .bind(changes.cost)
            .bind(changes.is_active)
            .fetch_optional(&db.pool),
    )
    .await
}

pub async fn delete(db: &Database, user_id: Uuid, id: Uuid) -> StoreResult<Option<Reward>> {
    let sql =
        format!("DELETE FROM rewards WHERE id = $1 AND user_id = $2 RETURNING {REWARD_COLUMNS}");
    bounded(
        db.timeout,
        sqlx::query_as::<_, Reward>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&db.pool),
    )
    .await
}

pub async fn lock(
    conn: &mut PgConnection,
    user_id: Uuid,
    id: Uuid,
) -> Result<Option<Reward>, sqlx::Error> {
    let sql = format!(
        "SELECT {REWARD_COLUMNS} FROM rewards WHERE id = $1 AND user_id = $2 FOR UPDATE"
    );
    sqlx::query_as::<_, Reward>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn mark_claimed(conn: &mut PgConnection, id: Uuid) -> Result<Reward, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE rewards
           SET claimed = TRUE, claimed_at = now(), updated_at = now()
         WHERE id = $1
        RETURNING {REWARD_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Reward>(&sql)
        .bind(id)
        .fetch_one(conn)
        .await
}
