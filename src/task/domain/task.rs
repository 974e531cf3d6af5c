//! Task aggregate root and related task lifecycle types.

use super::{ParseTaskStatusError, TaskDomainError, TaskId};
use crate::directory::domain::{OrganizationId, UserId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_TITLE_LENGTH: usize = 255;

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Task has been handed out but not yet acknowledged.
    New,
    /// The employee has taken the task on.
    Accepted,
    /// The employee finished the task.
    Completed,
    /// The employee declined the task.
    Rejected,
}

impl TaskStatus {
    /// Every status in lifecycle order.
    pub const ALL: [Self; 4] = [Self::New, Self::Accepted, Self::Completed, Self::Rejected];

    /// Returns the canonical storage representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Accepted => "accepted",
            Self::Completed => "completed",
            Self::Rejected => "rejected",
        }
    }

    /// Returns whether no further transitions are allowed.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Rejected)
    }

    /// Returns whether the lifecycle permits moving from `self` to `target`.
    #[must_use]
    pub const fn can_transition_to(self, target: Self) -> bool {
        matches!(
            (self, target),
            (Self::New, Self::Accepted | Self::Completed | Self::Rejected)
                | (Self::Accepted, Self::Completed | Self::Rejected)
        )
    }

    /// Statuses the employee may pick next.
    #[must_use]
    pub fn next_choices(self) -> Vec<Self> {
        Self::ALL
            .into_iter()
            .filter(|candidate| self.can_transition_to(*candidate))
            .collect()
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TaskStatus {
    type Error = ParseTaskStatusError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "new" => Ok(Self::New),
            "accepted" => Ok(Self::Accepted),
            "completed" => Ok(Self::Completed),
            "rejected" => Ok(Self::Rejected),
            _ => Err(ParseTaskStatusError(value.to_owned())),
        }
    }
}

/// Validated task title.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskTitle(String);

impl TaskTitle {
    /// Creates a validated title.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyTitle`] for a blank title or
    /// [`TaskDomainError::TitleTooLong`] when it exceeds 255 characters.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyTitle);
        }
        if trimmed.chars().count() > MAX_TITLE_LENGTH {
            return Err(TaskDomainError::TitleTooLong);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the title as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskTitle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskTitle {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskTitle> for String {
    fn from(value: TaskTitle) -> Self {
        value.0
    }
}

/// Validated task description.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskDescription(String);

impl TaskDescription {
    /// Creates a validated description.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EmptyDescription`] for a blank description.
    pub fn new(value: impl Into<String>) -> Result<Self, TaskDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(TaskDomainError::EmptyDescription);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the description as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TaskDescription {
    type Error = TaskDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TaskDescription> for String {
    fn from(value: TaskDescription) -> Self {
        value.0
    }
}

/// Task awaiting insertion; the store assigns its identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    /// Task title.
    pub title: TaskTitle,
    /// Task description.
    pub description: TaskDescription,
    /// Manager handing out the task.
    pub manager: UserId,
    /// Employee receiving the task.
    pub employee: UserId,
    /// Organization shared by manager and employee.
    pub organization: OrganizationId,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl NewTask {
    /// Creates an unsaved task stamped with the clock's current time.
    #[must_use]
    pub fn new(
        title: TaskTitle,
        description: TaskDescription,
        manager: UserId,
        employee: UserId,
        organization: OrganizationId,
        clock: &impl Clock,
    ) -> Self {
        Self {
            title,
            description,
            manager,
            employee,
            organization,
            created_at: clock.utc(),
        }
    }

    /// Builds the persisted task once the store assigned `id`.
    #[must_use]
    pub fn into_task(self, id: TaskId) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            status: TaskStatus::New,
            manager: self.manager,
            employee: self.employee,
            organization: self.organization,
            created_at: self.created_at,
        }
    }
}

/// Task aggregate root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    id: TaskId,
    title: TaskTitle,
    description: TaskDescription,
    status: TaskStatus,
    manager: UserId,
    employee: UserId,
    organization: OrganizationId,
    created_at: DateTime<Utc>,
}

/// Parameter object for reconstructing a persisted task aggregate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PersistedTaskData {
    /// Persisted task identifier.
    pub id: TaskId,
    /// Persisted title.
    pub title: TaskTitle,
    /// Persisted description.
    pub description: TaskDescription,
    /// Persisted status.
    pub status: TaskStatus,
    /// Persisted manager reference.
    pub manager: UserId,
    /// Persisted employee reference.
    pub employee: UserId,
    /// Persisted organization reference.
    pub organization: OrganizationId,
    /// Persisted creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl Task {
    /// Reconstructs a task from persisted storage.
    #[must_use]
    pub fn from_persisted(data: PersistedTaskData) -> Self {
        Self {
            id: data.id,
            title: data.title,
            description: data.description,
            status: data.status,
            manager: data.manager,
            employee: data.employee,
            organization: data.organization,
            created_at: data.created_at,
        }
    }

    /// Returns the task identifier.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }

    /// Returns the title.
    #[must_use]
    pub const fn title(&self) -> &TaskTitle {
        &self.title
    }

    /// Returns the description.
    #[must_use]
    pub const fn description(&self) -> &TaskDescription {
        &self.description
    }

    /// Returns the current status.
    #[must_use]
    pub const fn status(&self) -> TaskStatus {
        self.status
    }

    /// Returns the manager who handed out the task.
    #[must_use]
    pub const fn manager(&self) -> UserId {
        self.manager
    }

    /// Returns the assigned employee.
    #[must_use]
    pub const fn employee(&self) -> UserId {
        self.employee
    }

    /// Returns the organization.
    #[must_use]
    pub const fn organization(&self) -> OrganizationId {
        self.organization
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Checks whether the task can move to `target` without mutating it.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::AlreadyInState`] when `target` equals the
    /// current non-terminal status, or [`TaskDomainError::InvalidTransition`]
    /// when the task is terminal or the move goes backwards.
    pub fn check_transition(&self, target: TaskStatus) -> Result<(), TaskDomainError> {
        if !self.status.is_terminal() && self.status == target {
            return Err(TaskDomainError::AlreadyInState {
                task: self.id,
                status: target,
            });
        }
        if !self.status.can_transition_to(target) {
            return Err(TaskDomainError::InvalidTransition {
                task: self.id,
                from: self.status,
                to: target,
            });
        }
        Ok(())
    }

    /// Moves the task to `target`, returning the previous status.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`Task::check_transition`]; the task is left
    /// unchanged on error.
    pub fn transition_to(&mut self, target: TaskStatus) -> Result<TaskStatus, TaskDomainError> {
        self.check_transition(target)?;
        let previous = self.status;
        self.status = target;
        Ok(previous)
    }
}
