use thiserror::Error;

/// Notification pipeline error types
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("workload aggregator unreachable: {0}")]
    AggregatorUnreachable(String),

    #[error("workload aggregator returned HTTP {status}")]
    AggregatorStatus { status: u16 },

    #[error("circuit breaker is open - sync calls are blocked")]
    CircuitOpen,

    #[error("message queue error: {0}")]
    MessageQueue(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("delivery failed for transaction {transaction_id}: {message}")]
    DeliveryFailure {
        transaction_id: String,
        message: String,
    },

    #[error("internal error: {0}")]
    Internal(String),
}

impl NotifierError {
    /// True for outcomes of a sync channel attempt that count against the
    /// circuit breaker and trigger the async fallback. Everything else
    /// (serialization defects, config errors) is surfaced as-is.
    pub fn is_sync_channel_failure(&self) -> bool {
        matches!(
            self,
            NotifierError::AggregatorUnreachable(_) | NotifierError::AggregatorStatus { .. }
        )
    }
}

/// Unified Result type for the pipeline
pub type Result<T> = std::result::Result<T, NotifierError>;
