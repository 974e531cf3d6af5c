//! Port contracts for message delivery.

mod notifier;

#[cfg(test)]
pub use notifier::MockNotifier;
pub use notifier::{DeliveryResult, Notifier};
