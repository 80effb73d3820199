use async_trait::async_trait;

use crate::{models::WorkloadEvent, Result};

/// Synchronous channel to the workload aggregator.
///
/// Implementations classify each call as success or failure and do not retry;
/// retry and fallback decisions belong to the delivery coordinator.
#[async_trait]
pub trait WorkloadChannel: Send + Sync {
    /// Report a created or updated training for the event's trainer/period.
    async fn upsert_workload(&self, event: &WorkloadEvent) -> Result<()>;

    /// Remove the workload contribution for the event's trainer/period.
    async fn delete_workload(&self, event: &WorkloadEvent) -> Result<()>;
}
