pub mod config;
pub mod errors;
pub mod models;
pub mod traits;

pub use config::{
    AggregatorConfig, AppConfig, CircuitBreakerConfig, CircuitState, MessageQueueConfig,
    RedeliveryPolicyConfig,
};
pub use errors::{NotifierError, Result};
pub use models::{ActionType, WorkloadEvent, WorkloadMessage};
pub use traits::{WorkloadChannel, WorkloadQueueProducer};
