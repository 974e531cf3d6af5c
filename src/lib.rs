//! taskbot: a Telegram bot for handing out tasks inside organizations.
//!
//! A single administrator creates organizations and appoints their
//! managers. Managers enrol employees and assign them tasks; the
//! employees move their tasks from new to accepted and then to completed or
//! rejected.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, chat, memory)
//!
//! # Modules
//!
//! - [`directory`]: Users, roles and organizations
//! - [`task`]: Task creation and status lifecycle
//! - [`conversation`]: Per-user multi-step dialogue flows
//! - [`notification`]: Best-effort outbound delivery
//! - [`storage`]: In-memory and `PostgreSQL` stores
//! - [`telegram`]: Bot API transport
//! - [`config`] and [`telemetry`]: Process configuration and logging

pub mod config;
pub mod conversation;
pub mod directory;
pub mod notification;
pub mod storage;
pub mod task;
pub mod telegram;
pub mod telemetry;
