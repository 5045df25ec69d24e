use serde::Serialize;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub cost: i64,
    pub is_active: bool,
    pub claimed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub claimed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReward {
    pub title: String,
    pub description: Option<String>,
    pub cost: i64,
    pub is_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RewardChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i64>,
    pub is_active: Option<bool>,
}

/// Which subset of a user's rewards to list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardFilter {
    All,
    /// Active and not yet claimed.
    Available,
    /// Newest claim first.
    Claimed,
}

/// Claim preconditions, checked against the locked reward and snapshot.
pub fn check_claimable(reward: &Reward, coins: i64) -> Result<(), AppError> {
    if reward.claimed {
        return Err(AppError::validation("Reward already claimed"));
    }
    if !reward.is_active {
        return Err(AppError::validation("Reward is not active"));
    }
    if reward.cost > coins {
        return Err(AppError::validation("Not enough coins"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reward(cost: i64) -> Reward {
        let now = OffsetDateTime::now_utc();
        Reward {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Movie night".into(),
            description: None,
            cost,
            is_active: true,
            claimed: false,
            claimed_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn claimable_when_active_unclaimed_and_affordable() {
        assert!(check_claimable(&reward(50), 50).is_ok());
        assert!(check_claimable(&reward(0), 0).is_ok());
    }

    #[test]
    fn claim_rejections_in_order() {
        let mut r = reward(100);
        assert_eq!(check_claimable(&r, 10).unwrap_err().to_string(), "Not enough coins");

        r.is_active = false;
        assert_eq!(check_claimable(&r, 500).unwrap_err().to_string(), "Reward is not active");

        r.claimed = true;
        assert_eq!(
            check_claimable(&r, 500).unwrap_err().to_string(),
            "Reward already claimed"
        );
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(reward(3)).unwrap();
        assert_eq!(json["isActive"], true);
        assert!(json["claimedAt"].is_null());
    }
}
