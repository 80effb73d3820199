use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{NotifierError, Result};

pub(crate) mod duration_serde {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> std::result::Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

/// Breaker tuning for the sync channel to the aggregator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: usize,
    #[serde(with = "duration_serde")]
    pub open_duration: Duration,
    #[serde(with = "duration_serde")]
    pub failure_window: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_duration: Duration::from_secs(30),
            failure_window: Duration::from_secs(60),
        }
    }
}

impl CircuitBreakerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.failure_threshold == 0 {
            return Err(NotifierError::Configuration(
                "circuit_breaker.failure_threshold must be greater than 0".to_string(),
            ));
        }

        if self.open_duration.is_zero() {
            return Err(NotifierError::Configuration(
                "circuit_breaker.open_duration must be greater than 0".to_string(),
            ));
        }

        if self.failure_window.is_zero() {
            return Err(NotifierError::Configuration(
                "circuit_breaker.failure_window must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
