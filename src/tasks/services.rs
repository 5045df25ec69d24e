use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{
    repo,
    repo_types::{Task, TaskChanges},
};
use crate::{
    db::{bounded, Database},
    error::AppError,
    ledger::{
        repo::append_in,
        repo_types::{Metric, NewEvent},
    },
    users::{repo::adjust_gamification, repo_types::Gamification},
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionOutcome {
    pub task: Task,
    pub gamification: Gamification,
}

/// Ledger entries for flipping a task: gains when completing, the matching
/// spends when undoing. Zero rewards produce no entry.
pub fn completion_events(user_id: Uuid, xp: i64, coins: i64, completing: bool) -> Vec<NewEvent> {
    let make: fn(Uuid, Metric, i64) -> Option<NewEvent> = if completing {
        NewEvent::gain
    } else {
        NewEvent::spend
    };
    [make(user_id, Metric::Xp, xp), make(user_id, Metric::Coins, coins)]
        .into_iter()
        .flatten()
        .collect()
}

/// Net (xp, coins) change the events amount to.
pub fn deltas(events: &[NewEvent]) -> (i64, i64) {
    events.iter().fold((0, 0), |(xp, coins), e| match e.metric() {
        Metric::Xp => (xp + e.signed_value(), coins),
        Metric::Coins => (xp, coins + e.signed_value()),
    })
}

/// Updates a task under its row lock so a concurrent toggle can't slip
/// between the reward check and the write.
pub async fn update_task(
    db: &Database,
    user_id: Uuid,
    task_id: Uuid,
    changes: &TaskChanges,
) -> Result<Task, AppError> {
    let mut tx = bounded(db.timeout, db.pool.begin()).await?;

    let task = bounded(db.timeout, repo::lock(&mut *tx, user_id, task_id))
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    changes.check_against(&task)?;
    let task = bounded(db.timeout, repo::update(&mut *tx, task.id, changes)).await?;

    bounded(db.timeout, tx.commit()).await?;
    Ok(task)
}

/// Toggles completion. The task update, its ledger entries and the snapshot
/// change commit together; any failure drops the transaction.
pub async fn toggle_completion(
    db: &Database,
    user_id: Uuid,
    task_id: Uuid,
) -> Result<CompletionOutcome, AppError> {
    let mut tx = bounded(db.timeout, db.pool.begin()).await?;

    let task = bounded(db.timeout, repo::lock(&mut *tx, user_id, task_id))
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    let completing = !task.completed;
    let task = bounded(db.timeout, repo::set_completed(&mut *tx, task.id, completing)).await?;

    let events = completion_events(user_id, task.xp_reward, task.coin_reward, completing);
    for event in &events {
        bounded(db.timeout, append_in(&mut *tx, event)).await?;
    }
    let (xp_delta, coins_delta) = deltas(&events);
    let gamification = bounded(
        db.timeout,
        adjust_gamification(&mut *tx, user_id, xp_delta, coins_delta),
    )
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    bounded(db.timeout, tx.commit()).await?;
    info!(%user_id, task_id = %task.id, completing, xp_delta, coins_delta, "task toggled");
    Ok(CompletionOutcome { task, gamification })
}
