//! Logging wrapper around a [`Notifier`].

use crate::directory::domain::UserId;
use crate::notification::{
    domain::{BroadcastReport, DeliveryFailure, OutboundMessage},
    ports::{DeliveryResult, Notifier},
};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Sends messages once, logs failures and tallies broadcasts.
pub struct NotificationDispatcher<N>
where
    N: Notifier,
{
    notifier: Arc<N>,
}

impl<N> Clone for NotificationDispatcher<N>
where
    N: Notifier,
{
    fn clone(&self) -> Self {
        Self {
            notifier: Arc::clone(&self.notifier),
        }
    }
}

impl<N> NotificationDispatcher<N>
where
    N: Notifier,
{
    /// Creates a dispatcher over `notifier`.
    #[must_use]
    pub const fn new(notifier: Arc<N>) -> Self {
        Self { notifier }
    }

    /// Delivers one message.
    ///
    /// Unreachable recipients are logged as warnings, other failures as
    /// errors. Nothing is retried.
    ///
    /// # Errors
    ///
    /// Returns the [`DeliveryFailure`] reported by the notifier.
    pub async fn send(&self, recipient: UserId, message: &OutboundMessage) -> DeliveryResult {
        match self.notifier.deliver(recipient, message).await {
            Ok(()) => {
                debug!(recipient = %recipient, "message delivered");
                Ok(())
            }
            Err(failure) => {
                match &failure {
                    DeliveryFailure::Unreachable(reason) => {
                        warn!(recipient = %recipient, reason = %reason, "recipient unreachable");
                    }
                    DeliveryFailure::Transient(reason) => {
                        error!(recipient = %recipient, reason = %reason, "message delivery failed");
                    }
                }
                Err(failure)
            }
        }
    }

    /// Delivers `message` to every recipient in order.
    ///
    /// Failures never abort the loop; they are counted in the report.
    pub async fn broadcast(
        &self,
        recipients: &[UserId],
        message: &OutboundMessage,
    ) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        for recipient in recipients {
            let delivered = self.send(*recipient, message).await.is_ok();
            report.record(delivered);
        }
        debug!(sent = report.sent, failed = report.failed, "broadcast finished");
        report
    }
}
