pub mod coordinator;

pub use coordinator::{DeliveryCoordinator, DeliveryOutcome};
