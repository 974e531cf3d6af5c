//! Error types for task domain validation and parsing.

use super::{TaskId, TaskStatus};
use thiserror::Error;

/// Errors returned while constructing or transitioning domain task values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskDomainError {
    /// The task title is empty after trimming.
    #[error("task title must not be empty")]
    EmptyTitle,

    /// The task title exceeds the 255-character storage limit.
    #[error("task title exceeds 255 character limit")]
    TitleTooLong,

    /// The task description is empty after trimming.
    #[error("task description must not be empty")]
    EmptyDescription,

    /// The requested status change is not permitted by the lifecycle.
    #[error("invalid status transition for task {task}: {from} -> {to}")]
    InvalidTransition {
        /// Task whose status was to change.
        task: TaskId,
        /// Current status.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },

    /// The task already holds the requested non-terminal status.
    #[error("task {task} is already {status}")]
    AlreadyInState {
        /// Task whose status was to change.
        task: TaskId,
        /// Current and requested status.
        status: TaskStatus,
    },
}

/// Error returned while parsing task statuses from persistence or payloads.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown task status: {0}")]
pub struct ParseTaskStatusError(pub String);

/// Error returned while parsing an orphan policy.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown orphan policy: {0}")]
pub struct ParseOrphanPolicyError(pub String);
