//! `/start` and registration.

use super::{FlowController, FlowReplies};
use crate::conversation::{
    domain::{FlowState, home_keyboard},
    ports::FlowStore,
};
use crate::directory::{
    domain::{User, UserId},
    services::RegistryError,
};
use crate::notification::{
    domain::{Keyboard, OutboundMessage},
    ports::Notifier,
};
use crate::storage::Store;
use mockable::Clock;

const ASK_NAME: &str = "Enter your full name.";
const INVALID_NAME: &str =
    "Your name must not be empty or longer than 255 characters. Enter your full name.";

impl<S, F, N, C> FlowController<S, F, N, C>
where
    S: Store,
    F: FlowStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    pub(super) async fn start(&self, actor: UserId) -> FlowReplies {
        self.flows.clear(actor).await?;
        let user = self.registry.find_user(actor).await?;
        let text = self.renderer.welcome(user.as_ref())?;
        let keyboard = home_keyboard(user.as_ref().map(User::role));
        Ok(vec![OutboundMessage::new(text).with_keyboard(keyboard)])
    }

    pub(super) async fn start_registration(&self, actor: UserId) -> FlowReplies {
        if self.registry.find_user(actor).await?.is_some() {
            return self.go_home(actor, "You are already registered.").await;
        }
        self.flows.save(actor, FlowState::Registration).await?;
        Ok(vec![
            OutboundMessage::new(ASK_NAME).with_keyboard(Keyboard::Remove),
        ])
    }

    pub(super) async fn complete_registration(&self, actor: UserId, text: &str) -> FlowReplies {
        match self.registry.register(actor, text).await {
            Ok(user) => {
                let welcome = self.renderer.welcome(Some(&user))?;
                self.finish(actor, welcome).await
            }
            Err(RegistryError::Domain(_)) => Ok(vec![OutboundMessage::new(INVALID_NAME)]),
            Err(err) => Err(err.into()),
        }
    }
}
