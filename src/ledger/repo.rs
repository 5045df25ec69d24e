use std::time::Duration;

use async_trait::async_trait;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::repo_types::{EventKind, EventLogEntry, EventRow, Metric, NewEvent};
use crate::db::{bounded, Database, StoreResult};

const EVENT_COLUMNS: &str = "id, user_id, metric, type, value, created_at";

/// Append-only event log. There is no update or delete.
#[async_trait]
pub trait EventStore: Send + Sync {
    async fn append(&self, event: &NewEvent) -> StoreResult<EventLogEntry>;
    /// Newest first.
    async fn list(&self, user_id: Uuid, metric: Option<Metric>) -> StoreResult<Vec<EventLogEntry>>;
    /// Sum of `value` over the matching entries, 0 when there are none.
    async fn sum(&self, user_id: Uuid, metric: Metric, kind: EventKind) -> StoreResult<i64>;
}

#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgEventStore {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool.clone(),
            timeout: db.timeout,
        }
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    async fn append(&self, event: &NewEvent) -> StoreResult<EventLogEntry> {
        let mut conn = bounded(self.timeout, self.pool.acquire()).await?;
        let row = bounded(self.timeout, append_in(&mut *conn, event)).await?;
        row.try_into()
    }

    async fn list(&self, user_id: Uuid, metric: Option<Metric>) -> StoreResult<Vec<EventLogEntry>> {
        let sql = format!(
            r#"
            SELECT {EVENT_COLUMNS}
              FROM event_logs
             WHERE user_id = $1
               AND ($2::TEXT IS NULL OR metric = $2)
             ORDER BY created_at DESC, id DESC
            "#
        );
        let rows = bounded(
            self.timeout,
            sqlx::query_as::<_, EventRow>(&sql)
                .bind(user_id)
                .bind(metric.map(Metric::as_str))
                .fetch_all(&self.pool),
        )
        .await?;
        rows.into_iter().map(EventLogEntry::try_from).collect()
    }

    async fn sum(&self, user_id: Uuid, metric: Metric, kind: EventKind) -> StoreResult<i64> {
        bounded(
            self.timeout,
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COALESCE(SUM(value), 0)::BIGINT
                  FROM event_logs
                 WHERE user_id = $1 AND metric = $2 AND type = $3
                "#,
            )
            .bind(user_id)
            .bind(metric.as_str())
            .bind(kind.as_str())
            .fetch_one(&self.pool),
        )
        .await
    }
}

/// Inserts one entry on the given connection, so callers can make it part
/// of a wider transaction.
pub async fn append_in(conn: &mut PgConnection, event: &NewEvent) -> Result<EventRow, sqlx::Error> {
    let sql = format!(
        r#"
        INSERT INTO event_logs (id, user_id, metric, type, value)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING {EVENT_COLUMNS}
        "#
    );
    sqlx::query_as::<_, EventRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(event.user_id())
        .bind(event.metric().as_str())
        .bind(event.kind().as_str())
        .bind(event.value())
        .fetch_one(conn)
        .await
}
