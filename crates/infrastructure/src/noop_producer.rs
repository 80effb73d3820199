use async_trait::async_trait;
use tracing::warn;

use notifier_core::{NotifierError, Result, WorkloadEvent, WorkloadQueueProducer};

/// Stand-in producer for deployments without messaging configured.
///
/// Always reports the broker as unavailable so the coordinator's
/// fallback-then-fail logic stays uniform instead of special-casing an
/// absent collaborator.
pub struct NoOpQueueProducer;

#[async_trait]
impl WorkloadQueueProducer for NoOpQueueProducer {
    async fn publish(&self, event: &WorkloadEvent) -> Result<()> {
        warn!(
            transaction_id = %event.transaction_id,
            "messaging is not configured, dropping fallback publish"
        );
        Err(NotifierError::MessageQueue(
            "messaging is not configured".to_string(),
        ))
    }
}
