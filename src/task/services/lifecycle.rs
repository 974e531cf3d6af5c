//! Service layer for task creation, status changes and listings.

use crate::directory::{
    domain::{AccessDenied, Membership, Operation, OrganizationId, User, UserId, authorize},
    ports::{DirectoryRepository, DirectoryRepositoryError},
};
use crate::task::{
    domain::{
        NewTask, OrphanPolicy, Task, TaskDescription, TaskDomainError, TaskId, TaskStatus,
        TaskTitle,
    },
    ports::{TaskDetails, TaskFilter, TaskRepository, TaskRepositoryError},
};
use crate::telemetry::AUDIT_TARGET;
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Maximum number of tasks returned when listing a terminal status.
pub const TERMINAL_LISTING_LIMIT: usize = 20;

/// Request payload for handing out a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateTaskRequest {
    manager: UserId,
    employee: UserId,
    title: String,
    description: String,
}

impl CreateTaskRequest {
    /// Creates a request on behalf of `manager` for `employee`.
    #[must_use]
    pub fn new(
        manager: UserId,
        employee: UserId,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            manager,
            employee,
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Outcome of a status change request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusUpdate {
    /// The status changed.
    Changed {
        /// The task after the change.
        task: Task,
        /// Status held before the change.
        previous: TaskStatus,
    },
    /// The task already held the requested status; nothing was written.
    AlreadyInState {
        /// The task as stored.
        task: Task,
    },
}

impl StatusUpdate {
    /// Returns the task carried by either outcome.
    #[must_use]
    pub const fn task(&self) -> &Task {
        match self {
            Self::Changed { task, .. } | Self::AlreadyInState { task } => task,
        }
    }
}

/// Service-level errors for task lifecycle operations.
#[derive(Debug, Error)]
pub enum TaskLifecycleError {
    /// The actor's role does not permit the operation.
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    /// The actor is not the task's assigned employee.
    #[error("user {actor} is not assigned to task {task}")]
    NotAssignee {
        /// Task the actor tried to change.
        task: TaskId,
        /// Acting user.
        actor: UserId,
    },
    /// The task does not exist.
    #[error("task not found: {0}")]
    NotFound(TaskId),
    /// A referenced user is not registered.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The employee does not belong to the manager's organization.
    #[error("user {employee} is not an employee of organization {organization}")]
    OrganizationMismatch {
        /// Organization of the manager.
        organization: OrganizationId,
        /// Requested employee.
        employee: UserId,
    },
    /// The lifecycle does not allow the requested change.
    #[error("invalid status transition for task {task}: {from} -> {to}")]
    InvalidTransition {
        /// Task whose status was to change.
        task: TaskId,
        /// Status observed in the store.
        from: TaskStatus,
        /// Requested status.
        to: TaskStatus,
    },
    /// The orphan policy freezes the task.
    #[error("task {0} is frozen because its manager or employee lost their role")]
    Frozen(TaskId),
    /// A party's membership changed while the task was being created.
    #[error("membership of user {0} changed concurrently")]
    MembershipChanged(UserId),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(TaskDomainError),
    /// Directory lookup failed.
    #[error(transparent)]
    Directory(#[from] DirectoryRepositoryError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(TaskRepositoryError),
}

impl TaskLifecycleError {
    /// Returns whether the failure came from the store rather than from the
    /// request.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::Directory(_) | Self::Repository(_))
    }
}

impl From<TaskDomainError> for TaskLifecycleError {
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::InvalidTransition { task, from, to } => {
                Self::InvalidTransition { task, from, to }
            }
            other => Self::Domain(other),
        }
    }
}

impl From<TaskRepositoryError> for TaskLifecycleError {
    fn from(err: TaskRepositoryError) -> Self {
        match err {
            TaskRepositoryError::NotFound(id) => Self::NotFound(id),
            TaskRepositoryError::MembershipChanged(id) => Self::MembershipChanged(id),
            other @ TaskRepositoryError::Persistence(_) => Self::Repository(other),
        }
    }
}

/// Result type for task lifecycle service operations.
pub type TaskLifecycleResult<T> = Result<T, TaskLifecycleError>;

/// Task lifecycle orchestration service.
#[derive(Clone)]
pub struct TaskLifecycleService<T, D, C>
where
    T: TaskRepository,
    D: DirectoryRepository,
    C: Clock + Send + Sync,
{
    tasks: Arc<T>,
    directory: Arc<D>,
    clock: Arc<C>,
    orphan_policy: OrphanPolicy,
}

impl<T, D, C> TaskLifecycleService<T, D, C>
where
    T: TaskRepository,
    D: DirectoryRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new task lifecycle service.
    #[must_use]
    pub const fn new(
        tasks: Arc<T>,
        directory: Arc<D>,
        clock: Arc<C>,
        orphan_policy: OrphanPolicy,
    ) -> Self {
        Self {
            tasks,
            directory,
            clock,
            orphan_policy,
        }
    }

    /// Hands out a new task in status `new`.
    ///
    /// The organization is taken from the manager's membership.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] when the actor is not a
    /// manager, [`TaskLifecycleError::OrganizationMismatch`] when the
    /// employee is not in the manager's organization,
    /// [`TaskLifecycleError::Domain`] when title or description are invalid,
    /// or [`TaskLifecycleError::MembershipChanged`] when a membership changed
    /// before the insert committed.
    pub async fn create_task(&self, request: CreateTaskRequest) -> TaskLifecycleResult<Task> {
        let CreateTaskRequest {
            manager,
            employee,
            title,
            description,
        } = request;
        let acting = self.directory.find_user(manager).await?;
        let manager_user = authorize(acting.as_ref(), Operation::CreateTask)?;
        let Membership::Manager(organization) = manager_user.membership() else {
            return Err(TaskLifecycleError::Forbidden(AccessDenied::Role {
                role: manager_user.role(),
                operation: Operation::CreateTask,
            }));
        };

        let assignee = self.user_or_error(employee).await?;
        if !assignee.membership().is_employee_of(organization) {
            return Err(TaskLifecycleError::OrganizationMismatch {
                organization,
                employee,
            });
        }

        let new_task = NewTask::new(
            TaskTitle::new(title)?,
            TaskDescription::new(description)?,
            manager,
            employee,
            organization,
            &*self.clock,
        );
        let task = self.tasks.insert(&new_task).await?;
        info!(
            target: AUDIT_TARGET,
            actor = %manager,
            employee = %employee,
            task = %task.id(),
            "task created"
        );
        Ok(task)
    }

    /// Changes the status of a task on behalf of its assigned employee.
    ///
    /// The write is a compare-and-set on the status the decision was based
    /// on. When a concurrent update wins, the loser observes the stored
    /// status: a matching non-terminal status is reported as
    /// [`StatusUpdate::AlreadyInState`], anything else as
    /// [`TaskLifecycleError::InvalidTransition`] from the observed status.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::NotFound`] when the task is absent,
    /// [`TaskLifecycleError::NotAssignee`] when the actor is not the assigned
    /// employee, [`TaskLifecycleError::Frozen`] when the orphan policy
    /// freezes the task, or [`TaskLifecycleError::InvalidTransition`] when
    /// the task is terminal or the move goes backwards.
    pub async fn set_status(
        &self,
        id: TaskId,
        target: TaskStatus,
        actor: UserId,
    ) -> TaskLifecycleResult<StatusUpdate> {
        let mut task = self.task_or_error(id).await?;
        if task.employee() != actor {
            return Err(TaskLifecycleError::NotAssignee { task: id, actor });
        }
        if self.orphan_policy == OrphanPolicy::Freeze && self.is_orphaned(&task).await? {
            return Err(TaskLifecycleError::Frozen(id));
        }

        let previous = match task.transition_to(target) {
            Ok(previous) => previous,
            Err(TaskDomainError::AlreadyInState { .. }) => {
                return Ok(StatusUpdate::AlreadyInState { task });
            }
            Err(err) => return Err(err.into()),
        };

        if self
            .tasks
            .compare_and_set_status(id, previous, target)
            .await?
        {
            info!(
                target: AUDIT_TARGET,
                actor = %actor,
                task = %id,
                from = %previous,
                to = %target,
                "task status changed"
            );
            return Ok(StatusUpdate::Changed { task, previous });
        }

        // The request was decided on a stale status.
        let current = self.task_or_error(id).await?;
        if let Err(TaskDomainError::AlreadyInState { .. }) = current.check_transition(target) {
            return Ok(StatusUpdate::AlreadyInState { task: current });
        }
        Err(TaskLifecycleError::InvalidTransition {
            task: id,
            from: current.status(),
            to: target,
        })
    }

    /// Loads a task without an authorization check.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Repository`] when the lookup fails.
    pub async fn find_task(&self, id: TaskId) -> TaskLifecycleResult<Option<Task>> {
        Ok(self.tasks.find_by_id(id).await?)
    }

    /// Lists tasks assigned to the acting employee, newest first.
    ///
    /// Listings of a terminal status are capped at
    /// [`TERMINAL_LISTING_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-employees.
    pub async fn list_assigned(
        &self,
        actor: UserId,
        status: Option<TaskStatus>,
    ) -> TaskLifecycleResult<Vec<TaskDetails>> {
        self.authorized(actor, Operation::ListAssignedTasks).await?;
        Ok(self
            .tasks
            .list_for_employee(actor, listing_filter(status))
            .await?)
    }

    /// Lists tasks handed out by the acting manager, newest first.
    ///
    /// Listings of a terminal status are capped at
    /// [`TERMINAL_LISTING_LIMIT`].
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-managers.
    pub async fn list_managed(
        &self,
        actor: UserId,
        status: Option<TaskStatus>,
    ) -> TaskLifecycleResult<Vec<TaskDetails>> {
        self.authorized(actor, Operation::ListManagedTasks).await?;
        Ok(self
            .tasks
            .list_for_manager(actor, listing_filter(status))
            .await?)
    }

    /// Returns the acting employee's `new` and `accepted` task ids, oldest
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`TaskLifecycleError::Forbidden`] for non-employees.
    pub async fn pending_queue(&self, actor: UserId) -> TaskLifecycleResult<Vec<TaskId>> {
        self.authorized(actor, Operation::UpdateTaskStatus).await?;
        Ok(self.tasks.pending_for_employee(actor).await?)
    }

    async fn is_orphaned(&self, task: &Task) -> TaskLifecycleResult<bool> {
        let organization = task.organization();
        let employee = self.directory.find_user(task.employee()).await?;
        let manager = self.directory.find_user(task.manager()).await?;
        let employee_ok = employee.is_some_and(|user| user.membership().is_employee_of(organization));
        let manager_ok = manager.is_some_and(|user| user.membership().is_manager_of(organization));
        Ok(!(employee_ok && manager_ok))
    }

    async fn authorized(&self, actor: UserId, operation: Operation) -> TaskLifecycleResult<User> {
        let acting = self.directory.find_user(actor).await?;
        authorize(acting.as_ref(), operation)?;
        acting.ok_or(TaskLifecycleError::UserNotFound(actor))
    }

    async fn user_or_error(&self, id: UserId) -> TaskLifecycleResult<User> {
        self.directory
            .find_user(id)
            .await?
            .ok_or(TaskLifecycleError::UserNotFound(id))
    }

    async fn task_or_error(&self, id: TaskId) -> TaskLifecycleResult<Task> {
        self.tasks
            .find_by_id(id)
            .await?
            .ok_or(TaskLifecycleError::NotFound(id))
    }
}

const fn listing_filter(status: Option<TaskStatus>) -> TaskFilter {
    match status {
        Some(terminal) if terminal.is_terminal() => TaskFilter::new()
            .with_status(terminal)
            .with_limit(TERMINAL_LISTING_LIMIT),
        Some(open) => TaskFilter::new().with_status(open),
        None => TaskFilter::new(),
    }
}
