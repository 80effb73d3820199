use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{NotifierError, Result};

/// Connection settings for the workload aggregator's REST endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub base_url: String,
    pub auth_token: String,
    pub call_timeout_seconds: u64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8081".to_string(),
            auth_token: String::new(),
            call_timeout_seconds: 5,
        }
    }
}

impl AggregatorConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(NotifierError::Configuration(
                "aggregator.base_url must not be empty".to_string(),
            ));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(NotifierError::Configuration(
                "aggregator.base_url must start with http:// or https://".to_string(),
            ));
        }

        if self.call_timeout_seconds == 0 {
            return Err(NotifierError::Configuration(
                "aggregator.call_timeout_seconds must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(AggregatorConfig::default().validate().is_ok());
    }

    #[test]
    fn url_scheme_is_enforced() {
        let config = AggregatorConfig {
            base_url: "ftp://aggregator".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = AggregatorConfig {
            call_timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
