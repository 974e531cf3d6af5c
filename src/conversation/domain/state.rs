//! Per-user dialogue state.

use crate::directory::domain::{OrganizationId, UserId};
use crate::task::domain::{TaskId, TaskTitle};

/// Kind of input a state is waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpectedInput {
    /// A reply-keyboard menu selection.
    Menu,
    /// Free text.
    Text,
    /// An inline button press.
    Button,
}

/// Step a user is at, carrying only what the step needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FlowState {
    /// No flow in progress.
    #[default]
    Idle,
    /// Waiting for the full name of a new user.
    Registration,
    /// Waiting for the name of a new organization.
    CreateOrganization,
    /// Waiting for the numeric id of the organization to delete.
    DeleteOrganization,
    /// Waiting for the deletion to be confirmed.
    ConfirmOrganizationDeletion {
        /// Organization to delete.
        organization: OrganizationId,
    },
    /// Waiting for the plain user to promote to manager.
    AssignManagerCandidate,
    /// Waiting for the organization of the new manager.
    AssignManagerOrganization {
        /// User being promoted.
        candidate: UserId,
    },
    /// Waiting for the manager to demote.
    RevokeManager,
    /// Waiting for the plain user to promote to employee.
    AssignEmployee,
    /// Waiting for the employee to demote.
    RevokeEmployee,
    /// Waiting for the employee receiving a new task.
    TaskAssignee,
    /// Waiting for the title of a new task.
    TaskTitle {
        /// Employee receiving the task.
        employee: UserId,
    },
    /// Waiting for the description of a new task.
    TaskDescription {
        /// Employee receiving the task.
        employee: UserId,
        /// Validated title.
        title: TaskTitle,
    },
    /// Waiting for the broadcast text.
    Broadcast,
    /// Waiting for the full reset to be confirmed.
    ConfirmReset,
    /// Walking an employee through pending tasks.
    StatusReview(StatusReview),
}

impl FlowState {
    /// Returns the kind of input the state consumes.
    #[must_use]
    pub const fn expected_input(&self) -> ExpectedInput {
        match self {
            Self::Idle => ExpectedInput::Menu,
            Self::Registration
            | Self::CreateOrganization
            | Self::DeleteOrganization
            | Self::TaskTitle { .. }
            | Self::TaskDescription { .. }
            | Self::Broadcast => ExpectedInput::Text,
            Self::ConfirmOrganizationDeletion { .. }
            | Self::AssignManagerCandidate
            | Self::AssignManagerOrganization { .. }
            | Self::RevokeManager
            | Self::AssignEmployee
            | Self::RevokeEmployee
            | Self::TaskAssignee
            | Self::ConfirmReset
            | Self::StatusReview(_) => ExpectedInput::Button,
        }
    }

    /// Returns the state name used in logs.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Registration => "registration",
            Self::CreateOrganization => "create_organization",
            Self::DeleteOrganization => "delete_organization",
            Self::ConfirmOrganizationDeletion { .. } => "confirm_organization_deletion",
            Self::AssignManagerCandidate => "assign_manager_candidate",
            Self::AssignManagerOrganization { .. } => "assign_manager_organization",
            Self::RevokeManager => "revoke_manager",
            Self::AssignEmployee => "assign_employee",
            Self::RevokeEmployee => "revoke_employee",
            Self::TaskAssignee => "task_assignee",
            Self::TaskTitle { .. } => "task_title",
            Self::TaskDescription { .. } => "task_description",
            Self::Broadcast => "broadcast",
            Self::ConfirmReset => "confirm_reset",
            Self::StatusReview(_) => "status_review",
        }
    }
}

/// How a status review was started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewMode {
    /// Every pending task captured from the menu.
    Batch,
    /// One task opened from its notification.
    Single,
}

/// Fixed queue of tasks captured when a status review starts.
///
/// The queue never changes after capture; tasks that became terminal or
/// were reassigned are skipped when the cursor reaches them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReview {
    queue: Vec<TaskId>,
    cursor: usize,
    updated: usize,
    skipped: usize,
    mode: ReviewMode,
}

impl StatusReview {
    /// Starts a review over the employee's pending tasks, oldest first.
    #[must_use]
    pub const fn batch(queue: Vec<TaskId>) -> Self {
        Self {
            queue,
            cursor: 0,
            updated: 0,
            skipped: 0,
            mode: ReviewMode::Batch,
        }
    }

    /// Starts a review of a single task.
    #[must_use]
    pub fn single(task: TaskId) -> Self {
        Self {
            queue: vec![task],
            cursor: 0,
            updated: 0,
            skipped: 0,
            mode: ReviewMode::Single,
        }
    }

    /// Returns the task under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<TaskId> {
        self.queue.get(self.cursor).copied()
    }

    /// Moves past the current task, counting it as updated or skipped.
    pub const fn advance(&mut self, updated: bool) {
        if updated {
            self.updated += 1;
        } else {
            self.skipped += 1;
        }
        self.cursor += 1;
    }

    /// Returns whether every captured task has been visited.
    #[must_use]
    pub const fn is_exhausted(&self) -> bool {
        self.cursor >= self.queue.len()
    }

    /// Number of captured tasks.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether nothing was captured.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Tasks whose status the employee changed.
    #[must_use]
    pub const fn updated(&self) -> usize {
        self.updated
    }

    /// Tasks passed over without a change.
    #[must_use]
    pub const fn skipped(&self) -> usize {
        self.skipped
    }

    /// How the review was started.
    #[must_use]
    pub const fn mode(&self) -> ReviewMode {
        self.mode
    }
}
