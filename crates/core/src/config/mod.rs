mod aggregator;
mod circuit_breaker;
mod message_queue;

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use aggregator::AggregatorConfig;
pub use circuit_breaker::{CircuitBreakerConfig, CircuitState};
pub use message_queue::{MessageQueueConfig, RedeliveryPolicyConfig};

use crate::{NotifierError, Result};

/// Top-level pipeline configuration.
///
/// Loaded from a TOML file with per-section defaults, then overridden by
/// environment variables for the values that differ per deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub aggregator: AggregatorConfig,
    pub message_queue: MessageQueueConfig,
    pub circuit_breaker: CircuitBreakerConfig,
}

impl AppConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            NotifierError::Configuration(format!(
                "failed to read config file {}: {e}",
                path.display()
            ))
        })?;

        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| NotifierError::Configuration(format!("TOML parse error: {e}")))
    }

    /// Deployment-specific secrets and addresses come from the environment.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("NOTIFIER_AGGREGATOR_URL") {
            self.aggregator.base_url = url;
        }
        if let Ok(token) = std::env::var("NOTIFIER_AGGREGATOR_TOKEN") {
            self.aggregator.auth_token = token;
        }
        if let Ok(url) = std::env::var("NOTIFIER_BROKER_URL") {
            self.message_queue.url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        self.aggregator.validate()?;
        self.message_queue.validate()?;
        self.circuit_breaker.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn empty_toml_falls_back_to_defaults() {
        let config = AppConfig::from_toml("").unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.message_queue.workload_queue, "workload-queue");
        assert_eq!(config.circuit_breaker.failure_threshold, 5);
    }

    #[test]
    fn partial_toml_overrides_selected_sections() {
        let content = r#"
            [aggregator]
            base_url = "https://aggregator.example.com"
            auth_token = "secret"
            call_timeout_seconds = 3

            [circuit_breaker]
            failure_threshold = 10
            open_duration = 120
            failure_window = 300

            [message_queue.redelivery]
            max_redeliveries = 5
            initial_delay_ms = 500
            backoff_multiplier = 3.0
        "#;

        let config = AppConfig::from_toml(content).unwrap();
        assert_eq!(config.aggregator.base_url, "https://aggregator.example.com");
        assert_eq!(config.aggregator.call_timeout(), Duration::from_secs(3));
        assert_eq!(config.circuit_breaker.failure_threshold, 10);
        assert_eq!(
            config.circuit_breaker.open_duration,
            Duration::from_secs(120)
        );
        assert_eq!(config.message_queue.redelivery.max_redeliveries, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.message_queue.url, "amqp://localhost:5672");
    }

    #[test]
    fn malformed_toml_is_a_configuration_error() {
        let result = AppConfig::from_toml("[aggregator\nbase_url = ");
        assert!(matches!(result, Err(NotifierError::Configuration(_))));
    }

    #[test]
    fn invalid_section_fails_validation() {
        let content = r#"
            [circuit_breaker]
            failure_threshold = 0
        "#;
        let config = AppConfig::from_toml(content).unwrap();
        assert!(config.validate().is_err());
    }
}
