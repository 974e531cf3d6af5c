//! Role and organization registry.
//!
//! Tracks which registered user holds which role in which organization and
//! decides who may perform which privileged action. The module follows
//! hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Orchestration services in [`services`]
//!
//! Store adapters live in [`crate::storage`] because organization deletion
//! and full resets cascade into task rows inside one transaction.

pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
