use sqlx::PgConnection;
use uuid::Uuid;

use super::repo_types::{Frequency, NewTask, Task, TaskChanges, TaskCounts};
use crate::db::{bounded, Database, StoreResult};

const TASK_COLUMNS: &str = "id, user_id, title, description, frequency, xp_reward, coin_reward, \
     completed, completed_at, created_at, updated_at";

pub async fn list_by_user(
    db: &Database,
    user_id: Uuid,
    frequency: Option<Frequency>,
) -> StoreResult<Vec<Task>> {
    let sql = format!(
        r#"
        SELECT {TASK_COLUMNS}
          FROM tasks
         WHERE user_id = $1
           AND ($2::TEXT IS NULL OR frequency = $2)
         ORDER BY created_at DESC
        "#
    );
    bounded(
        db.timeout,
        sqlx::query_as::<_, Task>(&sql)
            .bind(user_id)
            .bind(frequency.map(Frequency::as_str))
            .fetch_all(&db.pool),
    )
    .await
}

pub async fn find(db: &Database, user_id: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
    let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2");
    bounded(
        db.timeout,
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&db.pool),
    )
    .await
}

pub async fn insert(db: &Database, user_id: Uuid, task: &NewTask) -> StoreResult<Task> {
    let sql = format!(
        r#"
        INSERT INTO tasks (id, user_id, title, description, frequency, xp_reward, coin_reward)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING {TASK_COLUMNS}
        "#
    );
    bounded(
        db.timeout,
        sqlx::query_as::<_, Task>(&sql)
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&task.title)
            .bind(task.description.as_deref())
            .bind(task.frequency.as_str())
            .bind(task.xp_reward)
            .bind(task.coin_reward)
            .fetch_one(&db.pool),
    )
    .await
}

/// Applies a partial update inside the caller's transaction.
pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    changes: &TaskChanges,
) -> Result<Task, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE tasks
           SET title = COALESCE($2, title),
               description = COALESCE($3, description),
               frequency = COALESCE($4, frequency),
               xp_reward = COALESCE($5, xp_reward),
               coin_reward = COALESCE($6, coin_reward),
               updated_at = now()
         WHERE id = $1
        RETURNING {TASK_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Task>(&sql)
        .bind(id)
        .bind(changes.title.as_deref())
        .bind(changes.description.as_deref())
        .bind(changes.frequency.map(Frequency::as_str))
        .bind(changes.xp_reward)
        .bind(changes.coin_reward)
        .fetch_one(conn)
        .await
}

pub async fn delete(db: &Database, user_id: Uuid, id: Uuid) -> StoreResult<Option<Task>> {
    let sql = format!("DELETE FROM tasks WHERE id = $1 AND user_id = $2 RETURNING {TASK_COLUMNS}");
    bounded(
        db.timeout,
        sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .bind(user_id)
            .fetch_optional(&db.pool),
    )
    .await
}

pub async fn counts(db: &Database, user_id: Uuid) -> StoreResult<TaskCounts> {
    bounded(
        db.timeout,
        sqlx::query_as::<_, TaskCounts>(
            r#"
            SELECT COUNT(*)::BIGINT AS total,
                   COUNT(*) FILTER (WHERE completed)::BIGINT AS completed,
                   COALESCE(SUM(xp_reward) FILTER (WHERE completed), 0)::BIGINT AS xp_earned,
                   COALESCE(SUM(coin_reward) FILTER (WHERE completed), 0)::BIGINT AS coins_earned
              FROM tasks
             WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&db.pool),
    )
    .await
}

/// Row-locks the task for the rest of the transaction.
pub async fn lock(conn: &mut PgConnection, user_id: Uuid, id: Uuid) -> Result<Option<Task>, sqlx::Error> {
    let sql = format!(
        "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2 FOR UPDATE"
    );
    sqlx::query_as::<_, Task>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(conn)
        .await
}

pub async fn set_completed(conn: &mut PgConnection, id: Uuid, completed: bool) -> Result<Task, sqlx::Error> {
    let sql = format!(
        r#"
        UPDATE tasks
           SET completed = $2,
               completed_at = CASE WHEN $2 THEN now() ELSE NULL END,
               updated_at = now()
         WHERE id = $1
        RETURNING {TASK_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Task>(&sql)
        .bind(id)
        .bind(completed)
        .fetch_one(conn)
        .await
}
