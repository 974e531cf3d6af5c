//! Outbound delivery port.

use crate::directory::domain::UserId;
use crate::notification::domain::{DeliveryFailure, OutboundMessage};
use async_trait::async_trait;

/// Result type for a single delivery.
pub type DeliveryResult = Result<(), DeliveryFailure>;

/// Pushes a message to one user's private chat.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers `message` to `recipient` exactly once.
    ///
    /// # Errors
    ///
    /// Returns [`DeliveryFailure::Unreachable`] when the recipient blocked
    /// the bot or deleted the chat, and [`DeliveryFailure::Transient`] for
    /// any other transport failure.
    async fn deliver(&self, recipient: UserId, message: &OutboundMessage) -> DeliveryResult;
}
