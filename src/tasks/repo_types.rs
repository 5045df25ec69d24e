use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::error::AppError;

pub const DEFAULT_XP_REWARD: i64 = 10;
pub const DEFAULT_COIN_REWARD: i64 = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Once => "once",
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl FromStr for Frequency {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "once" => Ok(Frequency::Once),
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(AppError::validation("Invalid frequency")),
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub frequency: String,
    pub xp_reward: i64,
    pub coin_reward: i64,
    pub completed: bool,
    #[serde(with = "time::serde::rfc3339::option")]
    pub completed_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// A validated task ready to insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub xp_reward: i64,
    pub coin_reward: i64,
}

/// Validated partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub frequency: Option<Frequency>,
    pub xp_reward: Option<i64>,
    pub coin_reward: Option<i64>,
}

impl TaskChanges {
    /// A completed task's rewards are already in the ledger, so they stay
    /// fixed until the task is un-completed.
    pub fn check_against(&self, task: &Task) -> Result<(), AppError> {
        let xp_change = self.xp_reward.is_some_and(|v| v != task.xp_reward);
        let coins_change = self.coin_reward.is_some_and(|v| v != task.coin_reward);
        if task.completed && (xp_change || coins_change) {
            return Err(AppError::validation(
                "Rewards of a completed task cannot be changed",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, FromRow)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
    pub xp_earned: i64,
    pub coins_earned: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStats {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub pending_tasks: i64,
    pub completion_rate: i64,
    pub total_xp_earned: i64,
    pub total_coins_earned: i64,
}

/// Percentage of completed tasks, rounded half up. 0 when there are no tasks.
pub fn completion_rate(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (200 * completed + total) / (2 * total)
}

impl From<TaskCounts> for TaskStats {
    fn from(c: TaskCounts) -> Self {
        Self {
            total_tasks: c.total,
            completed_tasks: c.completed,
            pending_tasks: c.total - c.completed,
            completion_rate: completion_rate(c.completed, c.total),
            total_xp_earned: c.xp_earned,
            total_coins_earned: c.coins_earned,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frequency_parsing() {
        assert_eq!("daily".parse::<Frequency>().unwrap(), Frequency::Daily);
        assert_eq!("Monthly".parse::<Frequency>().unwrap(), Frequency::Monthly);
        assert!(matches!(
            "yearly".parse::<Frequency>(),
            Err(AppError::Validation(_))
        ));
        assert_eq!(Frequency::default(), Frequency::Once);
    }

    fn task(completed: bool) -> Task {
        let now = OffsetDateTime::now_utc();
        Task {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Stretch".into(),
            description: None,
            frequency: "daily".into(),
            xp_reward: 10,
            coin_reward: 5,
            completed,
            completed_at: completed.then_some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn completed_task_keeps_its_rewards() {
        let raise = TaskChanges {
            xp_reward: Some(500),
            ..Default::default()
        };
        let err = raise.check_against(&task(true)).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(raise.check_against(&task(false)).is_ok());

        let same = TaskChanges {
            xp_reward: Some(10),
            coin_reward: Some(5),
            title: Some("Stretch more".into()),
            ..Default::default()
        };
        assert!(same.check_against(&task(true)).is_ok());
    }

    #[test]
    fn completion_rate_rounds_like_a_percentage() {
        assert_eq!(completion_rate(0, 0), 0);
        assert_eq!(completion_rate(1, 3), 33);
        assert_eq!(completion_rate(2, 3), 67);
        assert_eq!(completion_rate(1, 8), 13);
        assert_eq!(completion_rate(4, 4), 100);
    }

    #[test]
    fn stats_from_counts() {
        let stats = TaskStats::from(TaskCounts {
            total: 5,
            completed: 2,
            xp_earned: 30,
            coins_earned: 12,
        });
        assert_eq!(stats.pending_tasks, 3);
        assert_eq!(stats.completion_rate, 40);
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["totalXpEarned"], 30);
        assert_eq!(json["completionRate"], 40);
    }
}
