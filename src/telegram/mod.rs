//! Telegram transport.
//!
//! [`TelegramNotifier`] implements the notification port on top of the Bot
//! API. [`run`] normalizes updates into [`crate::conversation::domain::Inbound`]
//! events, feeds them to the flow controller and sends the replies back.

mod handler;
mod notifier;

pub use handler::{BotController, run};
pub use notifier::TelegramNotifier;
