mod channel;
mod queue;

pub use channel::WorkloadChannel;
pub use queue::WorkloadQueueProducer;
