//! Notification orchestration services.

mod dispatcher;

pub use dispatcher::NotificationDispatcher;
