use std::sync::Arc;

use tracing::info;

use notifier_core::{
    AppConfig, Result, WorkloadChannel, WorkloadEvent, WorkloadQueueProducer,
};
use notifier_delivery::{DeliveryCoordinator, DeliveryOutcome};
use notifier_infrastructure::{
    AggregatorClient, CircuitBreaker, NoOpQueueProducer, RabbitMqWorkloadProducer,
};

/// Wired-up notification pipeline.
pub struct Application {
    coordinator: DeliveryCoordinator,
    broker: Option<Arc<RabbitMqWorkloadProducer>>,
}

impl Application {
    /// Build the pipeline from configuration. When messaging is disabled the
    /// no-op producer takes the queue's place, so the coordinator logic is
    /// identical either way.
    pub async fn build(config: AppConfig) -> Result<Self> {
        config.validate()?;

        let breaker = CircuitBreaker::with_config(config.circuit_breaker.clone());

        let sync_channel: Arc<dyn WorkloadChannel> =
            Arc::new(AggregatorClient::new(config.aggregator.clone())?);

        let mut broker = None;
        let queue_producer: Arc<dyn WorkloadQueueProducer> = if config.message_queue.enabled {
            let producer =
                Arc::new(RabbitMqWorkloadProducer::new(config.message_queue.clone()).await?);
            broker = Some(Arc::clone(&producer));
            producer
        } else {
            info!("messaging disabled, running without a fallback queue");
            Arc::new(NoOpQueueProducer)
        };

        Ok(Self {
            coordinator: DeliveryCoordinator::new(breaker, sync_channel, queue_producer),
            broker,
        })
    }

    pub async fn notify(&self, event: WorkloadEvent) -> Result<DeliveryOutcome> {
        self.coordinator.notify(event).await
    }

    /// Close the broker connection, if one was opened.
    pub async fn shutdown(&self) -> Result<()> {
        if let Some(broker) = &self.broker {
            if broker.is_connected() {
                broker.close().await?;
            }
        }
        Ok(())
    }
}
