//! Event ledger aggregation. Balances are recomputed from the entries on
//! every read; no running total is cached.

use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{
    repo::EventStore,
    repo_types::{EventKind, EventLogEntry, Metric, NewEvent},
};
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricStats {
    pub gained: i64,
    pub spent: i64,
    pub net: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub xp: MetricStats,
    pub coins: MetricStats,
}

#[derive(Clone)]
pub struct Ledger {
    events: Arc<dyn EventStore>,
}

impl Ledger {
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Parses the untyped parts and appends one entry.
    pub async fn record_event(
        &self,
        user_id: Uuid,
        metric: &str,
        kind: &str,
        value: i64,
    ) -> Result<EventLogEntry, AppError> {
        let event = NewEvent::new(user_id, metric.parse()?, kind.parse()?, value)?;
        self.record(&event).await
    }

    pub async fn record(&self, event: &NewEvent) -> Result<EventLogEntry, AppError> {
        let entry = self.events.append(event).await?;
        info!(
            user_id = %entry.user_id,
            metric = %entry.metric,
            kind = entry.kind.as_str(),
            value = entry.value,
            "event recorded"
        );
        Ok(entry)
    }

    pub async fn history(
        &self,
        user_id: Uuid,
        metric: Option<&str>,
    ) -> Result<Vec<EventLogEntry>, AppError> {
        let metric = metric.map(str::parse::<Metric>).transpose()?;
        Ok(self.events.list(user_id, metric).await?)
    }

    /// Sum of gains minus sum of spends for `metric`.
    pub async fn net_balance(&self, user_id: Uuid, metric: &str) -> Result<i64, AppError> {
        self.balance(user_id, metric.parse()?).await
    }

    pub async fn balance(&self, user_id: Uuid, metric: Metric) -> Result<i64, AppError> {
        Ok(self.metric_stats(user_id, metric).await?.net)
    }

    pub async fn stats(&self, user_id: Uuid) -> Result<LedgerStats, AppError> {
        Ok(LedgerStats {
            xp: self.metric_stats(user_id, Metric::Xp).await?,
            coins: self.metric_stats(user_id, Metric::Coins).await?,
        })
    }

    async fn metric_stats(&self, user_id: Uuid, metric: Metric) -> Result<MetricStats, AppError> {
        let gained = self.events.sum(user_id, metric, EventKind::Gain).await?;
        let spent = self.events.sum(user_id, metric, EventKind::Spend).await?;
        Ok(MetricStats {
            gained,
            spent,
            net: gained - spent,
        })
    }
}
