//! Delivery coordinator for workload notifications.
//!
//! Orchestrates one event end to end: consult the circuit breaker, attempt
//! the sync channel, fall back to the durable queue, and surface a terminal
//! error only when both paths refused the event. Notification is best-effort
//! relative to the domain write that produced the event; no outcome here
//! ever rolls that write back.

use std::sync::Arc;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use notifier_core::{
    ActionType, NotifierError, Result, WorkloadChannel, WorkloadEvent, WorkloadQueueProducer,
};
use notifier_infrastructure::{CallPermit, CircuitBreaker};

/// Terminal outcome of a delivery attempt. The third terminal state,
/// `Failed`, is the `Err(NotifierError::DeliveryFailure)` arm of `notify`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The aggregator accepted the event on the sync channel.
    SyncSuccess,
    /// The event was handed to the durable queue; the broker owns it now.
    AsyncEnqueued,
}

pub struct DeliveryCoordinator {
    breaker: CircuitBreaker,
    sync_channel: Arc<dyn WorkloadChannel>,
    queue_producer: Arc<dyn WorkloadQueueProducer>,
}

impl DeliveryCoordinator {
    pub fn new(
        breaker: CircuitBreaker,
        sync_channel: Arc<dyn WorkloadChannel>,
        queue_producer: Arc<dyn WorkloadQueueProducer>,
    ) -> Self {
        Self {
            breaker,
            sync_channel,
            queue_producer,
        }
    }

    /// Deliver one event, producing exactly one terminal outcome.
    ///
    /// An event arriving without a transaction id gets one generated here;
    /// a caller-supplied id is reused unchanged so internal retries of the
    /// same domain operation stay correlated.
    pub async fn notify(&self, mut event: WorkloadEvent) -> Result<DeliveryOutcome> {
        if event.transaction_id.is_empty() {
            event.transaction_id = Uuid::new_v4().to_string();
        }

        let permit = self.breaker.acquire().await;
        if permit == CallPermit::Rejected {
            debug!(
                transaction_id = %event.transaction_id,
                "circuit is open, skipping sync attempt"
            );
        } else {
            match self.attempt_sync(&event).await {
                Ok(()) => {
                    self.breaker.record_success().await;
                    info!(
                        trainer = %event.trainer_username,
                        transaction_id = %event.transaction_id,
                        "workload delivered on sync channel"
                    );
                    return Ok(DeliveryOutcome::SyncSuccess);
                }
                Err(e) if e.is_sync_channel_failure() => {
                    self.breaker.record_failure().await;
                    warn!(
                        trainer = %event.trainer_username,
                        transaction_id = %event.transaction_id,
                        "sync delivery failed, falling back to queue: {e}"
                    );
                }
                // Anything else is a defect, not a channel failure. The
                // breaker saw no channel outcome, so an unused trial slot
                // must be handed back or half-open would jam shut.
                Err(e) => {
                    if permit == CallPermit::Probe {
                        self.breaker.release_probe().await;
                    }
                    return Err(e);
                }
            }
        }

        match self.queue_producer.publish(&event).await {
            Ok(()) => {
                info!(
                    trainer = %event.trainer_username,
                    transaction_id = %event.transaction_id,
                    "workload enqueued for async delivery"
                );
                Ok(DeliveryOutcome::AsyncEnqueued)
            }
            Err(e @ NotifierError::Serialization(_)) => Err(e),
            Err(e) => {
                error!(
                    trainer = %event.trainer_username,
                    transaction_id = %event.transaction_id,
                    "both delivery paths failed: {e}"
                );
                Err(NotifierError::DeliveryFailure {
                    transaction_id: event.transaction_id,
                    message: e.to_string(),
                })
            }
        }
    }

    async fn attempt_sync(&self, event: &WorkloadEvent) -> Result<()> {
        match event.action_type {
            ActionType::CreateUpdate => self.sync_channel.upsert_workload(event).await,
            ActionType::Delete => self.sync_channel.delete_workload(event).await,
        }
    }
}
