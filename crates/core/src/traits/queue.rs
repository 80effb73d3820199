use async_trait::async_trait;

use crate::{models::WorkloadEvent, Result};

/// Durable fallback channel for events the sync path could not deliver.
///
/// Ownership of the event transfers to the broker on a successful publish;
/// redelivery and dead-lettering past that point are broker concerns.
#[async_trait]
pub trait WorkloadQueueProducer: Send + Sync {
    async fn publish(&self, event: &WorkloadEvent) -> Result<()>;
}
