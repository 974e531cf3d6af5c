//! Delivery outcomes.

use thiserror::Error;

/// Why a message did not reach its recipient.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryFailure {
    /// The recipient blocked the bot or the chat no longer exists.
    #[error("recipient unreachable: {0}")]
    Unreachable(String),
    /// Any other transport failure.
    #[error("delivery failed: {0}")]
    Transient(String),
}

impl DeliveryFailure {
    /// Returns whether retrying could never succeed.
    #[must_use]
    pub const fn is_unreachable(&self) -> bool {
        matches!(self, Self::Unreachable(_))
    }
}

/// Tally of a broadcast.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Messages handed to the transport successfully.
    pub sent: usize,
    /// Messages that failed for any reason.
    pub failed: usize,
}

impl BroadcastReport {
    /// Counts one delivery outcome.
    pub const fn record(&mut self, delivered: bool) {
        if delivered {
            self.sent += 1;
        } else {
            self.failed += 1;
        }
    }

    /// Total number of attempted deliveries.
    #[must_use]
    pub const fn attempted(&self) -> usize {
        self.sent + self.failed
    }
}
