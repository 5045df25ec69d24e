use serde::Deserialize;

use super::repo_types::{NewReward, RewardChanges};
use crate::{error::AppError, ledger::repo_types::MAX_AMOUNT};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRewardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i64>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateRewardRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cost: Option<i64>,
    pub is_active: Option<bool>,
}

fn check_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::validation("Reward title is required"));
    }
    Ok(title.to_string())
}

fn check_cost(cost: i64) -> Result<i64, AppError> {
    if cost < 0 {
        return Err(AppError::validation("Cost cannot be negative"));
    }
    if cost > MAX_AMOUNT {
        return Err(AppError::validation(format!("Cost cannot exceed {MAX_AMOUNT}")));
    }
    Ok(cost)
}

impl CreateRewardRequest {
    pub fn validate(self) -> Result<NewReward, AppError> {
        Ok(NewReward {
            title: check_title(self.title.as_deref().unwrap_or_default())?,
            description: self.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            cost: check_cost(self.cost.unwrap_or(0))?,
            is_active: self.is_active.unwrap_or(true),
        })
    }
}

impl UpdateRewardRequest {
    pub fn validate(self) -> Result<RewardChanges, AppError> {
        Ok(RewardChanges {
            title: self.title.as_deref().map(check_title).transpose()?,
            description: self.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
            cost: self.cost.map(check_cost).transpose()?,
            is_active: self.is_active,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_free_and_active() {
        let reward = CreateRewardRequest {
            title: Some("Coffee".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(reward.cost, 0);
        assert!(reward.is_active);
    }

    #[test]
    fn rejects_blank_title_and_negative_cost() {
        assert!(CreateRewardRequest {
            title: Some("   ".into()),
            ..Default::default()
        }
        .validate()
        .is_err());

        let err = UpdateRewardRequest {
            cost: Some(-10),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "Cost cannot be negative");
    }

    #[test]
    fn cost_is_capped() {
        let err = CreateRewardRequest {
            title: Some("Trip".into()),
            cost: Some(i64::MAX),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), format!("Cost cannot exceed {MAX_AMOUNT}"));
    }

    #[test]
    fn reads_is_active() {
        let req: UpdateRewardRequest = serde_json::from_str(r#"{"isActive":false}"#).unwrap();
        assert_eq!(req.validate().unwrap().is_active, Some(false));
    }
}
