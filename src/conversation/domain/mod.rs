//! Domain model for conversational flows.

mod callback;
mod error;
mod inbound;
mod menu;
mod state;

pub use callback::Callback;
pub use error::ParseCallbackError;
pub use inbound::Inbound;
pub use menu::{MenuCommand, back_keyboard, home_keyboard};
pub use state::{ExpectedInput, FlowState, ReviewMode, StatusReview};
