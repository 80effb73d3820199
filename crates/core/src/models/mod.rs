mod event;
mod message;

pub use event::{ActionType, WorkloadEvent};
pub use message::WorkloadMessage;
