use std::sync::Arc;

use async_trait::async_trait;
use lapin::types::{AMQPValue, FieldTable};
use lapin::{
    options::*, BasicProperties, Channel, Connection, ConnectionProperties, Queue,
};
use tokio::sync::Mutex;
use tracing::{debug, info};

use notifier_core::{
    MessageQueueConfig, NotifierError, Result, WorkloadEvent, WorkloadMessage,
    WorkloadQueueProducer,
};

/// RabbitMQ producer for the durable fallback queue.
///
/// The channel runs in transacted mode: a publish only becomes durably
/// visible once `tx_commit` completes, so a crash between deciding to
/// enqueue and persisting the message cannot silently lose it. Messages are
/// published persistent (delivery mode 2) and the workload queue dead-letters
/// into the DLQ once the broker's redelivery budget is exhausted.
pub struct RabbitMqWorkloadProducer {
    connection: Connection,
    channel: Arc<Mutex<Channel>>,
    config: MessageQueueConfig,
}

impl RabbitMqWorkloadProducer {
    pub async fn new(config: MessageQueueConfig) -> Result<Self> {
        // The broker handshake is bounded so an unreachable broker cannot
        // hang startup past the configured timeout.
        let connection = tokio::time::timeout(
            config.connection_timeout(),
            Connection::connect(&config.url, ConnectionProperties::default()),
        )
        .await
        .map_err(|_| {
            NotifierError::MessageQueue(format!(
                "timed out connecting to broker after {}s",
                config.connection_timeout_seconds
            ))
        })?
        .map_err(|e| NotifierError::MessageQueue(format!("failed to connect to broker: {e}")))?;

        let channel = connection
            .create_channel()
            .await
            .map_err(|e| NotifierError::MessageQueue(format!("failed to create channel: {e}")))?;

        channel
            .tx_select()
            .await
            .map_err(|e| NotifierError::MessageQueue(format!("failed to enable tx mode: {e}")))?;

        info!("connected to broker: {}", config.url);

        let producer = Self {
            connection,
            channel: Arc::new(Mutex::new(channel)),
            config,
        };

        producer.initialize_queues().await?;

        Ok(producer)
    }

    /// Declare the workload queue and its dead-letter destination.
    async fn initialize_queues(&self) -> Result<()> {
        let channel = self.channel.lock().await;

        Self::declare_queue(&channel, &self.config.dead_letter_queue, FieldTable::default())
            .await?;

        Self::declare_queue(
            &channel,
            &self.config.workload_queue,
            Self::workload_queue_arguments(&self.config.dead_letter_queue),
        )
        .await?;

        info!(
            "queues initialized: {} (dead-letters into {})",
            self.config.workload_queue, self.config.dead_letter_queue
        );
        Ok(())
    }

    /// Arguments wiring broker-side dead-letter routing for the workload
    /// queue. Exhausted redeliveries land in the DLQ via the default
    /// exchange, not through application code.
    fn workload_queue_arguments(dead_letter_queue: &str) -> FieldTable {
        let mut arguments = FieldTable::default();
        arguments.insert(
            "x-dead-letter-exchange".into(),
            AMQPValue::LongString("".into()),
        );
        arguments.insert(
            "x-dead-letter-routing-key".into(),
            AMQPValue::LongString(dead_letter_queue.into()),
        );
        arguments
    }

    async fn declare_queue(
        channel: &Channel,
        queue_name: &str,
        arguments: FieldTable,
    ) -> Result<Queue> {
        let queue = channel
            .queue_declare(
                queue_name,
                QueueDeclareOptions {
                    durable: true,
                    exclusive: false,
                    auto_delete: false,
                    ..Default::default()
                },
                arguments,
            )
            .await
            .map_err(|e| {
                NotifierError::MessageQueue(format!("failed to declare queue {queue_name}: {e}"))
            })?;

        debug!("queue {} declared", queue_name);
        Ok(queue)
    }

    fn serialize_message(message: &WorkloadMessage) -> Result<Vec<u8>> {
        serde_json::to_vec(message)
            .map_err(|e| NotifierError::Serialization(format!("failed to serialize message: {e}")))
    }

    fn message_properties(event: &WorkloadEvent) -> BasicProperties {
        BasicProperties::default()
            .with_delivery_mode(2) // 2 = persistent
            .with_content_type("application/json".into())
            .with_type(WorkloadMessage::MESSAGE_TYPE.into())
            .with_correlation_id(event.transaction_id.as_str().into())
    }

    pub fn is_connected(&self) -> bool {
        self.connection.status().connected()
    }

    pub async fn close(&self) -> Result<()> {
        self.connection
            .close(200, "normal shutdown")
            .await
            .map_err(|e| NotifierError::MessageQueue(format!("failed to close connection: {e}")))?;

        info!("broker connection closed");
        Ok(())
    }
}

#[async_trait]
impl WorkloadQueueProducer for RabbitMqWorkloadProducer {
    async fn publish(&self, event: &WorkloadEvent) -> Result<()> {
        let message = WorkloadMessage::from_event(event);
        let payload = Self::serialize_message(&message)?;

        let channel = self.channel.lock().await;

        let properties = Self::message_properties(event);

        let publish_result = async {
            let confirm = channel
                .basic_publish(
                    "",
                    &self.config.workload_queue,
                    BasicPublishOptions::default(),
                    &payload,
                    properties,
                )
                .await
                .map_err(|e| NotifierError::MessageQueue(format!("publish failed: {e}")))?;

            confirm
                .await
                .map_err(|e| NotifierError::MessageQueue(format!("publish not accepted: {e}")))?;

            channel
                .tx_commit()
                .await
                .map_err(|e| NotifierError::MessageQueue(format!("publish commit failed: {e}")))
        }
        .await;

        if let Err(publish_error) = publish_result {
            if let Err(rollback_error) = channel.tx_rollback().await {
                debug!("tx rollback after failed publish also failed: {rollback_error}");
            }
            return Err(publish_error);
        }

        debug!(
            transaction_id = %event.transaction_id,
            "event enqueued to {}",
            self.config.workload_queue
        );
        Ok(())
    }
}
