use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{
    repo,
    repo_types::{check_claimable, Reward},
};
use crate::{
    db::{bounded, Database},
    error::AppError,
    ledger::{
        repo::append_in,
        repo_types::{Metric, NewEvent},
    },
    users::{
        repo::{adjust_gamification, lock_gamification},
        repo_types::Gamification,
    },
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimOutcome {
    pub reward: Reward,
    pub gamification: Gamification,
}

/// Claims a reward. The reward and the user's snapshot are both locked, so
/// two claims racing for the same coins cannot both pass the balance check.
pub async fn claim(db: &Database, user_id: Uuid, reward_id: Uuid) -> Result<ClaimOutcome, AppError> {
    let mut tx = bounded(db.timeout, db.pool.begin()).await?;

    let reward = bounded(db.timeout, repo::lock(&mut *tx, user_id, reward_id))
        .await?
        .ok_or_else(|| AppError::not_found("Reward not found"))?;
    let snapshot = bounded(db.timeout, lock_gamification(&mut *tx, user_id))
        .await?
        .ok_or_else(|| AppError::not_found("User not found"))?;

    if let Err(e) = check_claimable(&reward, snapshot.coins) {
        warn!(%user_id, reward_id = %reward.id, reason = %e, "claim refused");
        return Err(e);
    }

    let reward = bounded(db.timeout, repo::mark_claimed(&mut *tx, reward.id)).await?;
    if let Some(event) = NewEvent::spend(user_id, Metric::Coins, reward.cost) {
        bounded(db.timeout, append_in(&mut *tx, &event)).await?;
    }
    let gamification = bounded(
        db.timeout,
        adjust_gamification(&mut *tx, user_id, 0, -reward.cost),
    )
    .await?
    .ok_or_else(|| AppError::not_found("User not found"))?;

    bounded(db.timeout, tx.commit()).await?;
    info!(%user_id, reward_id = %reward.id, cost = reward.cost, "reward claimed");
    Ok(ClaimOutcome {
        reward,
        gamification,
    })
}
