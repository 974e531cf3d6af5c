//! In-memory notifier recording every delivery, for tests.

use crate::directory::domain::UserId;
use crate::notification::{
    domain::{DeliveryFailure, OutboundMessage},
    ports::{DeliveryResult, Notifier},
};
use async_trait::async_trait;
use std::collections::BTreeSet;
use std::sync::{Arc, RwLock};

#[derive(Debug, Default)]
struct RecorderState {
    delivered: Vec<(UserId, OutboundMessage)>,
    unreachable: BTreeSet<UserId>,
}

/// Notifier that records deliveries and simulates blocked recipients.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    state: Arc<RwLock<RecorderState>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every later delivery to `recipient` fail as unreachable.
    pub fn block(&self, recipient: UserId) {
        if let Ok(mut state) = self.state.write() {
            state.unreachable.insert(recipient);
        }
    }

    /// Returns every successful delivery in order.
    #[must_use]
    pub fn delivered(&self) -> Vec<(UserId, OutboundMessage)> {
        self.state
            .read()
            .map(|state| state.delivered.clone())
            .unwrap_or_default()
    }

    /// Returns the messages delivered to `recipient` in order.
    #[must_use]
    pub fn delivered_to(&self, recipient: UserId) -> Vec<OutboundMessage> {
        self.delivered()
            .into_iter()
            .filter(|(id, _)| *id == recipient)
            .map(|(_, message)| message)
            .collect()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn deliver(&self, recipient: UserId, message: &OutboundMessage) -> DeliveryResult {
        let mut state = self
            .state
            .write()
            .map_err(|err| DeliveryFailure::Transient(err.to_string()))?;
        if state.unreachable.contains(&recipient) {
            return Err(DeliveryFailure::Unreachable(format!(
                "user {recipient} blocked the bot"
            )));
        }
        state.delivered.push((recipient, message.clone()));
        Ok(())
    }
}
