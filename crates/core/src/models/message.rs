use serde::{Deserialize, Serialize};

use super::{ActionType, WorkloadEvent};

/// Queue payload for the async fallback channel.
///
/// Field names match the aggregator consumer's wire schema. Redeliveries of
/// the same `transaction_id` carry identical payload fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkloadMessage {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_active: bool,
    pub year: i32,
    pub month: u32,
    pub training_duration: u32,
    pub action_type: ActionType,
    pub transaction_id: String,
}

impl WorkloadMessage {
    /// Schema marker stamped on the message `type` property so the consumer
    /// can deserialize polymorphically.
    pub const MESSAGE_TYPE: &'static str = "WorkloadMessage";

    pub fn from_event(event: &WorkloadEvent) -> Self {
        Self {
            username: event.trainer_username.clone(),
            first_name: event.first_name.clone(),
            last_name: event.last_name.clone(),
            is_active: event.is_active,
            year: event.year(),
            month: event.month(),
            training_duration: event.duration_minutes,
            action_type: event.action_type,
            transaction_id: event.transaction_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn message_serializes_with_wire_field_names() {
        let event = WorkloadEvent::created_or_updated(
            "jane.smith",
            "Jane",
            "Smith",
            true,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            60,
        )
        .with_transaction_id("tx-1");

        let message = WorkloadMessage::from_event(&event);
        let json: serde_json::Value = serde_json::to_value(&message).unwrap();

        assert_eq!(json["username"], "jane.smith");
        assert_eq!(json["firstName"], "Jane");
        assert_eq!(json["lastName"], "Smith");
        assert_eq!(json["isActive"], true);
        assert_eq!(json["year"], 2025);
        assert_eq!(json["month"], 1);
        assert_eq!(json["trainingDuration"], 60);
        assert_eq!(json["actionType"], "CREATE_UPDATE");
        assert_eq!(json["transactionId"], "tx-1");
    }

    #[test]
    fn rebuilding_from_the_same_event_yields_identical_payload() {
        let event = WorkloadEvent::deleted(
            "jane.smith",
            "Jane",
            "Smith",
            true,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        );

        // A broker redelivery re-serializes the same event; every field,
        // including the transaction id, must be identical.
        let first = WorkloadMessage::from_event(&event);
        let second = WorkloadMessage::from_event(&event);
        assert_eq!(first, second);
    }
}
