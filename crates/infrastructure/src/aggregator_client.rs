use async_trait::async_trait;
use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use notifier_core::{AggregatorConfig, NotifierError, Result, WorkloadChannel, WorkloadEvent};

const TRANSACTION_ID_HEADER: &str = "X-Transaction-ID";

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UpsertWorkloadRequest<'a> {
    first_name: &'a str,
    last_name: &'a str,
    is_active: bool,
    training_date: NaiveDate,
    training_duration: u32,
}

/// REST client for the workload aggregator's sync channel.
///
/// Classifies each call as success (2xx) or failure and never retries;
/// the bounded timeout keeps a hung aggregator from stalling the caller.
pub struct AggregatorClient {
    config: AggregatorConfig,
    http_client: reqwest::Client,
}

impl AggregatorClient {
    pub fn new(config: AggregatorConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.call_timeout())
            .build()
            .map_err(|e| {
                NotifierError::Configuration(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            config,
            http_client,
        })
    }

    fn workload_url(&self, event: &WorkloadEvent) -> String {
        format!(
            "{}/api/v1/trainers/{}/workloads/{}/{}",
            self.config.base_url.trim_end_matches('/'),
            event.trainer_username,
            event.year(),
            event.month()
        )
    }

    fn classify(operation: &str, event: &WorkloadEvent, response: reqwest::Response) -> Result<()> {
        let status = response.status();
        if status.is_success() {
            debug!(
                trainer = %event.trainer_username,
                transaction_id = %event.transaction_id,
                "{operation} accepted by aggregator"
            );
            Ok(())
        } else {
            warn!(
                trainer = %event.trainer_username,
                transaction_id = %event.transaction_id,
                status = status.as_u16(),
                "{operation} rejected by aggregator"
            );
            Err(NotifierError::AggregatorStatus {
                status: status.as_u16(),
            })
        }
    }

    fn transport_error(operation: &str, event: &WorkloadEvent, error: reqwest::Error) -> NotifierError {
        warn!(
            trainer = %event.trainer_username,
            transaction_id = %event.transaction_id,
            "{operation} could not reach aggregator: {error}"
        );
        NotifierError::AggregatorUnreachable(error.to_string())
    }
}

#[async_trait]
impl WorkloadChannel for AggregatorClient {
    async fn upsert_workload(&self, event: &WorkloadEvent) -> Result<()> {
        let body = UpsertWorkloadRequest {
            first_name: &event.first_name,
            last_name: &event.last_name,
            is_active: event.is_active,
            training_date: event.training_date,
            training_duration: event.duration_minutes,
        };

        match self
            .http_client
            .put(self.workload_url(event))
            .bearer_auth(&self.config.auth_token)
            .header(TRANSACTION_ID_HEADER, &event.transaction_id)
            .json(&body)
            .send()
            .await
        {
            Ok(response) => Self::classify("workload upsert", event, response),
            Err(e) => Err(Self::transport_error("workload upsert", event, e)),
        }
    }

    async fn delete_workload(&self, event: &WorkloadEvent) -> Result<()> {
        match self
            .http_client
            .delete(self.workload_url(event))
            .bearer_auth(&self.config.auth_token)
            .header(TRANSACTION_ID_HEADER, &event.transaction_id)
            .send()
            .await
        {
            Ok(response) => Self::classify("workload delete", event, response),
            Err(e) => Err(Self::transport_error("workload delete", event, e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn event() -> WorkloadEvent {
        WorkloadEvent::created_or_updated(
            "jane.smith",
            "Jane",
            "Smith",
            true,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
            60,
        )
        .with_transaction_id("tx-1")
    }

    fn client(base_url: &str) -> AggregatorClient {
        AggregatorClient::new(AggregatorConfig {
            base_url: base_url.to_string(),
            auth_token: "token-1".to_string(),
            call_timeout_seconds: 2,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn upsert_sends_identity_and_correlation_headers() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/api/v1/trainers/jane.smith/workloads/2025/1"))
            .and(header("Authorization", "Bearer token-1"))
            .and(header("X-Transaction-ID", "tx-1"))
            .and(body_json(serde_json::json!({
                "firstName": "Jane",
                "lastName": "Smith",
                "isActive": true,
                "trainingDate": "2025-01-15",
                "trainingDuration": 60,
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let result = client(&server.uri()).upsert_workload(&event()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn delete_targets_the_same_period_path() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/api/v1/trainers/jane.smith/workloads/2025/1"))
            .and(header("X-Transaction-ID", "tx-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let deletion = WorkloadEvent::deleted(
            "jane.smith",
            "Jane",
            "Smith",
            true,
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap(),
        )
        .with_transaction_id("tx-1");

        let result = client(&server.uri()).delete_workload(&deletion).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn non_2xx_is_a_service_failure() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let result = client(&server.uri()).upsert_workload(&event()).await;
        match result {
            Err(err @ NotifierError::AggregatorStatus { status: 503 }) => {
                assert!(err.is_sync_channel_failure())
            }
            other => panic!("expected AggregatorStatus 503, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_a_transport_failure() {
        // Nothing listens on this port.
        let result = client("http://127.0.0.1:1").upsert_workload(&event()).await;
        match result {
            Err(e @ NotifierError::AggregatorUnreachable(_)) => {
                assert!(e.is_sync_channel_failure())
            }
            other => panic!("expected AggregatorUnreachable, got {other:?}"),
        }
    }
}
