//! Conversational flows over chat updates.
//!
//! Each user has at most one multi-step flow in progress. The controller
//! reads the user's [`domain::FlowState`], consumes one inbound event and
//! writes the next state back through a [`ports::FlowStore`].
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
