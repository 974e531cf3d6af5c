//! Step definitions for bot behaviour scenarios.

pub mod world;

mod given;
mod then;
mod when;
