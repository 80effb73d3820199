use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{NotifierError, Result};

/// Broker-side redelivery contract for the fallback queue.
///
/// The broker, not the application, drives retries: a consumer that rejects a
/// message gets it redelivered up to `max_redeliveries` times with an
/// exponentially growing delay, after which the message is routed to the
/// dead-letter destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedeliveryPolicyConfig {
    pub max_redeliveries: u32,
    pub initial_delay_ms: u64,
    pub backoff_multiplier: f64,
}

impl Default for RedeliveryPolicyConfig {
    fn default() -> Self {
        Self {
            max_redeliveries: 3,
            initial_delay_ms: 1_000,
            backoff_multiplier: 2.0,
        }
    }
}

impl RedeliveryPolicyConfig {
    /// Delay before redelivery attempt `attempt` (1-based).
    /// Attempt 1 waits `initial_delay_ms`, attempt 2 waits
    /// `initial_delay_ms * backoff_multiplier`, and so on.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::from_millis(self.initial_delay_ms);
        }
        let factor = self.backoff_multiplier.powi(attempt as i32 - 1);
        Duration::from_millis((self.initial_delay_ms as f64 * factor) as u64)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_redeliveries == 0 {
            return Err(NotifierError::Configuration(
                "redelivery.max_redeliveries must be greater than 0".to_string(),
            ));
        }

        if self.initial_delay_ms == 0 {
            return Err(NotifierError::Configuration(
                "redelivery.initial_delay_ms must be greater than 0".to_string(),
            ));
        }

        if self.backoff_multiplier < 1.0 {
            return Err(NotifierError::Configuration(
                "redelivery.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Settings for the durable fallback queue.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageQueueConfig {
    /// Messaging is optional; when disabled the pipeline runs with a no-op
    /// producer and the sync channel is the only delivery path.
    pub enabled: bool,
    pub url: String,
    pub workload_queue: String,
    pub dead_letter_queue: String,
    pub connection_timeout_seconds: u64,
    pub redelivery: RedeliveryPolicyConfig,
}

impl Default for MessageQueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            url: "amqp://localhost:5672".to_string(),
            workload_queue: "workload-queue".to_string(),
            dead_letter_queue: "workload-dlq".to_string(),
            connection_timeout_seconds: 10,
            redelivery: RedeliveryPolicyConfig::default(),
        }
    }
}

impl MessageQueueConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        if self.url.is_empty() {
            return Err(NotifierError::Configuration(
                "message_queue.url must not be empty".to_string(),
            ));
        }

        if !self.url.starts_with("amqp://") && !self.url.starts_with("amqps://") {
            return Err(NotifierError::Configuration(
                "message_queue.url must start with amqp:// or amqps://".to_string(),
            ));
        }

        if self.workload_queue.is_empty() || self.dead_letter_queue.is_empty() {
            return Err(NotifierError::Configuration(
                "message_queue queue names must not be empty".to_string(),
            ));
        }

        if self.workload_queue == self.dead_letter_queue {
            return Err(NotifierError::Configuration(
                "message_queue.dead_letter_queue must differ from workload_queue".to_string(),
            ));
        }

        self.redelivery.validate()
    }
}
