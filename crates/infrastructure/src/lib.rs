pub mod aggregator_client;
pub mod circuit_breaker;
pub mod noop_producer;
pub mod rabbitmq_producer;

pub use aggregator_client::AggregatorClient;
pub use circuit_breaker::{CallPermit, CircuitBreaker, CircuitBreakerStats};
pub use noop_producer::NoOpQueueProducer;
pub use rabbitmq_producer::RabbitMqWorkloadProducer;
