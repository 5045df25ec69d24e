use serde::Deserialize;

use super::repo_types::{Frequency, NewTask, TaskChanges, DEFAULT_COIN_REWARD, DEFAULT_XP_REWARD};
use crate::{error::AppError, ledger::repo_types::MAX_AMOUNT};

const TITLE_MAX: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub xp_reward: Option<i64>,
    pub coin_reward: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<String>,
    pub xp_reward: Option<i64>,
    pub coin_reward: Option<i64>,
}

fn check_title(raw: &str) -> Result<String, AppError> {
    let title = raw.trim();
    if title.is_empty() {
        return Err(AppError::validation("Task title is required"));
    }
    if title.chars().count() > TITLE_MAX {
        return Err(AppError::validation(format!(
            "Task title cannot exceed {TITLE_MAX} characters"
        )));
    }
    Ok(title.to_string())
}

fn check_amount(field: &str, value: i64) -> Result<i64, AppError> {
    if value < 0 {
        return Err(AppError::validation(format!("{field} cannot be negative")));
    }
    if value > MAX_AMOUNT {
        return Err(AppError::validation(format!(
            "{field} cannot exceed {MAX_AMOUNT}"
        )));
    }
    Ok(value)
}

fn clean_description(raw: Option<String>) -> Option<String> {
    raw.map(|d| d.trim().to_string()).filter(|d| !d.is_empty())
}

impl CreateTaskRequest {
    pub fn validate(self) -> Result<NewTask, AppError> {
        let title = check_title(self.title.as_deref().unwrap_or_default())?;
        let frequency = match self.frequency.as_deref() {
            Some(f) => f.parse::<Frequency>()?,
            None => Frequency::default(),
        };
        Ok(NewTask {
            title,
            description: clean_description(self.description),
            frequency,
            xp_reward: check_amount("XP reward", self.xp_reward.unwrap_or(DEFAULT_XP_REWARD))?,
            coin_reward: check_amount(
                "Coin reward",
                self.coin_reward.unwrap_or(DEFAULT_COIN_REWARD),
            )?,
        })
    }
}

impl UpdateTaskRequest {
    pub fn validate(self) -> Result<TaskChanges, AppError> {
        Ok(TaskChanges {
            title: self.title.as_deref().map(check_title).transpose()?,
            description: clean_description(self.description),
            frequency: self.frequency.as_deref().map(str::parse::<Frequency>).transpose()?,
            xp_reward: self
                .xp_reward
                .map(|v| check_amount("XP reward", v))
                .transpose()?,
            coin_reward: self
                .coin_reward
                .map(|v| check_amount("Coin reward", v))
                .transpose()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_applies_defaults() {
        let task = CreateTaskRequest {
            title: Some("  Read 10 pages ".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(task.title, "Read 10 pages");
        assert_eq!(task.frequency, Frequency::Once);
        assert_eq!(task.xp_reward, 10);
        assert_eq!(task.coin_reward, 5);
    }

    #[test]
    fn create_requires_title() {
        let err = CreateTaskRequest::default().validate().unwrap_err();
        assert_eq!(err.to_string(), "Task title is required");
        let err = CreateTaskRequest {
            title: Some("x".repeat(101)),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn rewards_must_be_non_negative() {
        let err = CreateTaskRequest {
            title: Some("Run".into()),
            xp_reward: Some(-1),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "XP reward cannot be negative");
    }

    #[test]
    fn rewards_are_capped() {
        let err = UpdateTaskRequest {
            coin_reward: Some(MAX_AMOUNT + 1),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(CreateTaskRequest {
            title: Some("Run".into()),
            xp_reward: Some(MAX_AMOUNT),
            ..Default::default()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn update_only_sets_given_fields() {
        let changes = UpdateTaskRequest {
            frequency: Some("weekly".into()),
            ..Default::default()
        }
        .validate()
        .unwrap();
        assert_eq!(
            changes,
            TaskChanges {
                frequency: Some(Frequency::Weekly),
                ..Default::default()
            }
        );

        let bad = UpdateTaskRequest {
            frequency: Some("hourly".into()),
            ..Default::default()
        };
        assert!(bad.validate().is_err());
    }

    #[test]
    fn camel_case_body() {
        let req: CreateTaskRequest =
            serde_json::from_str(r#"{"title":"Gym","xpReward":25,"coinReward":0}"#).unwrap();
        let task = req.validate().unwrap();
        assert_eq!((task.xp_reward, task.coin_reward), (25, 0));
    }
}
