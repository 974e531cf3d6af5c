//! Domain model for outbound messages and delivery outcomes.

mod delivery;
mod message;

pub use delivery::{BroadcastReport, DeliveryFailure};
pub use message::{Button, Keyboard, OutboundMessage};
