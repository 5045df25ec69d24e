use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{db::StoreError, error::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Xp,
    Coins,
}

impl Metric {
    pub fn as_str(self) -> &'static str {
        match self {
            Metric::Xp => "xp",
            Metric::Coins => "coins",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "xp" => Ok(Metric::Xp),
            "coins" => Ok(Metric::Coins),
            other => Err(AppError::validation(format!(
                "Unsupported metric: {other}. Expected one of: xp, coins"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Gain,
    Spend,
}

impl EventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EventKind::Gain => "gain",
            EventKind::Spend => "spend",
        }
    }
}

impl FromStr for EventKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "gain" => Ok(EventKind::Gain),
            "spend" => Ok(EventKind::Spend),
            other => Err(AppError::validation(format!(
                "Unsupported event type: {other}. Expected one of: gain, spend"
            ))),
        }
    }
}

/// Immutable ledger row as clients see it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventLogEntry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub metric: Metric,
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub value: i64,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Raw `event_logs` row; enums are stored as text.
#[derive(Debug, Clone, FromRow)]
pub struct EventRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub metric: String,
    #[sqlx(rename = "type")]
    pub kind: String,
    pub value: i64,
    pub created_at: OffsetDateTime,
}

impl TryFrom<EventRow> for EventLogEntry {
    type Error = StoreError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let metric = row
            .metric
            .parse()
            .map_err(|_| StoreError::Unexpected(format!("bad metric in event_logs: {}", row.metric)))?;
        let kind = row
            .kind
            .parse()
            .map_err(|_| StoreError::Unexpected(format!("bad type in event_logs: {}", row.kind)))?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            metric,
            kind,
            value: row.value,
            created_at: row.created_at,
        })
    }
}

/// Largest amount a single entry, task reward or reward cost may carry.
/// Keeps per-user sums far inside `BIGINT`.
pub const MAX_AMOUNT: i64 = i32::MAX as i64;

/// An entry about to be appended. Only constructible with a value in
/// `0..=MAX_AMOUNT`; spending is expressed through `EventKind::Spend`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    user_id: Uuid,
    metric: Metric,
    kind: EventKind,
    value: i64,
}

impl NewEvent {
    pub fn new(user_id: Uuid, metric: Metric, kind: EventKind, value: i64) -> Result<Self, AppError> {
        if value < 0 {
            return Err(AppError::validation("Event value must be a non-negative integer"));
        }
        if value > MAX_AMOUNT {
            return Err(AppError::validation(format!(
                "Event value cannot exceed {MAX_AMOUNT}"
            )));
        }
        Ok(Self {
            user_id,
            metric,
            kind,
            value,
        })
    }

    /// Positive gain, or `None` when there is nothing to record.
    pub fn gain(user_id: Uuid, metric: Metric, value: i64) -> Option<Self> {
        (value > 0).then_some(Self {
            user_id,
            metric,
            kind: EventKind::Gain,
            value,
        })
    }

    /// Positive spend, or `None` when there is nothing to record.
    pub fn spend(user_id: Uuid, metric: Metric, value: i64) -> Option<Self> {
        (value > 0).then_some(Self {
            user_id,
            metric,
            kind: EventKind::Spend,
            value,
        })
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn metric(&self) -> Metric {
        self.metric
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn value(&self) -> i64 {
        self.value
    }

    /// Contribution to the net balance of its metric.
    pub fn signed_value(&self) -> i64 {
        match self.kind {
            EventKind::Gain => self.value,
            EventKind::Spend => -self.value,
        }
    }
}
