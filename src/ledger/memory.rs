use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{
    repo::EventStore,
    repo_types::{EventKind, EventLogEntry, Metric, NewEvent},
};
use crate::db::{StoreError, StoreResult};

#[derive(Clone, Default)]
pub struct MemoryEventStore {
    entries: Arc<Mutex<Vec<EventLogEntry>>>,
}

impl MemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EventStore for MemoryEventStore {
    async fn append(&self, event: &NewEvent) -> StoreResult<EventLogEntry> {
        let entry = EventLogEntry {
            id: Uuid::new_v4(),
            user_id: event.user_id(),
            metric: event.metric(),
            kind: event.kind(),
            value: event.value(),
            created_at: OffsetDateTime::now_utc(),
        };
        self.entries.lock().await.push(entry.clone());
        Ok(entry)
    }

    async fn list(&self, user_id: Uuid, metric: Option<Metric>) -> StoreResult<Vec<EventLogEntry>> {
        let entries = self.entries.lock().await;
        // insertion order is chronological, so reversing gives newest first
        Ok(entries
            .iter()
            .rev()
            .filter(|e| e.user_id == user_id && metric.map_or(true, |m| e.metric == m))
            .cloned()
            .collect())
    }

    async fn sum(&self, user_id: Uuid, metric: Metric, kind: EventKind) -> StoreResult<i64> {
        let entries = self.entries.lock().await;
        entries
            .iter()
            .filter(|e| e.user_id == user_id && e.metric == metric && e.kind == kind)
            .try_fold(0i64, |acc, e| acc.checked_add(e.value))
            .ok_or_else(|| StoreError::Unexpected("event sum overflowed".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overflowing_sum_is_an_error() {
        let store = MemoryEventStore::new();
        let user = Uuid::new_v4();
        for value in [i64::MAX, 1] {
            let event = NewEvent::gain(user, Metric::Xp, value).unwrap();
            store.append(&event).await.unwrap();
        }
        assert!(matches!(
            store.sum(user, Metric::Xp, EventKind::Gain).await,
            Err(StoreError::Unexpected(_))
        ));
        assert_eq!(store.sum(user, Metric::Coins, EventKind::Gain).await.unwrap(), 0);
    }
}
