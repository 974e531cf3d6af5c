//! Task lifecycle management.
//!
//! Managers hand out tasks to employees of their own organization; the
//! assigned employee moves the task forward through its statuses. The module
//! follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Orchestration services in [`services`]
//!
//! Store adapters live in [`crate::storage`].

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
