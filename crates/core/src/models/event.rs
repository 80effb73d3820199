use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// What happened to the training that produced this event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
    CreateUpdate,
    Delete,
}

/// The unit of work flowing through the notification pipeline.
///
/// Snapshot of the trainer's identity plus the training period, taken at the
/// moment the originating write committed. The `transaction_id` is generated
/// once per domain operation and reused verbatim across every retry and
/// broker redelivery so the aggregator can deduplicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkloadEvent {
    pub trainer_username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub training_date: NaiveDate,
    pub duration_minutes: u32,
    pub action_type: ActionType,
    pub transaction_id: String,
}

impl WorkloadEvent {
    /// Event for a created or updated training session.
    pub fn created_or_updated(
        trainer_username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        is_active: bool,
        training_date: NaiveDate,
        duration_minutes: u32,
    ) -> Self {
        Self {
            trainer_username: trainer_username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            is_active,
            training_date,
            duration_minutes,
            action_type: ActionType::CreateUpdate,
            transaction_id: Uuid::new_v4().to_string(),
        }
    }

    /// Event for a deleted training session. Duration is always 0.
    pub fn deleted(
        trainer_username: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        is_active: bool,
        training_date: NaiveDate,
    ) -> Self {
        Self {
            trainer_username: trainer_username.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            is_active,
            training_date,
            duration_minutes: 0,
            action_type: ActionType::Delete,
            transaction_id: Uuid::new_v4().to_string(),
        }
    }

    /// Reuse a caller-supplied correlation id instead of the generated one.
    pub fn with_transaction_id(mut self, transaction_id: impl Into<String>) -> Self {
        self.transaction_id = transaction_id.into();
        self
    }

    pub fn year(&self) -> i32 {
        self.training_date.year()
    }

    pub fn month(&self) -> u32 {
        self.training_date.month()
    }
}
