//! Conversation orchestration services.

mod controller;
mod error;
pub(crate) mod render;

pub use controller::{FlowController, FlowReplies};
pub use error::FlowError;
