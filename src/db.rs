use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// Failures surfaced by any record store adapter.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    /// Timeout or lost connection. Retryable.
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("unexpected store error: {0}")]
    Unexpected(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(e.to_string())
            }
            sqlx::Error::Database(ref db) if db.code().as_deref() == Some("23505") => {
                StoreError::Conflict(db.constraint().unwrap_or("unique").to_string())
            }
            other => StoreError::Unexpected(other.to_string()),
        }
    }
}

/// Runs a store call, failing with `Unavailable` once `limit` elapses.
pub async fn bounded<T, F>(limit: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(res) => res.map_err(StoreError::from),
        Err(_) => Err(StoreError::Unavailable(format!(
            "store call exceeded {}ms",
            limit.as_millis()
        ))),
    }
}

/// Postgres pool plus the per-call timeout every query is bounded by.
#[derive(Clone)]
pub struct Database {
    pub pool: PgPool,
    pub timeout: Duration,
}

impl Database {
    pub async fn connect(config: &AppConfig) -> anyhow::Result<Self> {
        let timeout = Duration::from_millis(config.store_timeout_ms);
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(timeout)
            .connect(&config.database_url)
            .await
            .context("connect to database")?;
        Ok(Self { pool, timeout })
    }

    /// Pool that only connects on first use.
    #[cfg(test)]
    pub fn lazy(url: &str, timeout: Duration) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .acquire_timeout(timeout)
            .connect_lazy(url)
            .context("build lazy pool")?;
        Ok(Self { pool, timeout })
    }
}
