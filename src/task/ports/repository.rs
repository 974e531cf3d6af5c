//! Repository port for task persistence, lookup and status updates.

use crate::directory::domain::{FullName, UserId};
use crate::task::domain::{NewTask, Task, TaskId, TaskStatus};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for task repository operations.
pub type TaskRepositoryResult<T> = Result<T, TaskRepositoryError>;

/// Listing filter for task queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    status: Option<TaskStatus>,
    limit: Option<usize>,
}

impl TaskFilter {
    /// Creates a filter matching every task.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            status: None,
            limit: None,
        }
    }

    /// Restricts results to one status.
    #[must_use]
    pub const fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Caps the number of newest results returned.
    #[must_use]
    pub const fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Returns the status restriction, if any.
    #[must_use]
    pub const fn status(&self) -> Option<TaskStatus> {
        self.status
    }

    /// Returns the result cap, if any.
    #[must_use]
    pub const fn limit(&self) -> Option<usize> {
        self.limit
    }
}

/// Task joined with the display names of its manager and employee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDetails {
    /// The task.
    pub task: Task,
    /// Manager display name.
    pub manager_name: FullName,
    /// Employee display name.
    pub employee_name: FullName,
}

/// Task persistence contract.
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// Inserts a task in status `new` and returns it with its assigned id.
    ///
    /// The manager and employee memberships are re-validated inside the
    /// insert transaction.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::MembershipChanged`] when either party no
    /// longer holds its role in the task's organization.
    async fn insert(&self, task: &NewTask) -> TaskRepositoryResult<Task>;

    /// Finds a task by id.
    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>>;

    /// Sets the status to `next` only if it still equals `expected`.
    ///
    /// Returns `false` when the stored status differs from `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`TaskRepositoryError::NotFound`] when the task is absent.
    async fn compare_and_set_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
    ) -> TaskRepositoryResult<bool>;

    /// Lists tasks assigned to `employee`, newest first.
    async fn list_for_employee(
        &self,
        employee: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>>;

    /// Lists tasks handed out by `manager`, newest first.
    async fn list_for_manager(
        &self,
        manager: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>>;

    /// Returns ids of the employee's `new` and `accepted` tasks, oldest
    /// first.
    async fn pending_for_employee(&self, employee: UserId) -> TaskRepositoryResult<Vec<TaskId>>;
}

/// Errors returned by task repository implementations.
#[derive(Debug, Clone, Error)]
pub enum TaskRepositoryError {
    /// The task was not found.
    #[error("task not found: {0}")]
    NotFound(TaskId),

    /// A party to the task no longer holds the expected membership.
    #[error("membership of user {0} changed concurrently")]
    MembershipChanged(UserId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl TaskRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
