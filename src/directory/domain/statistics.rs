//! Aggregate counts shown to the admin.

use crate::task::domain::TaskStatus;

/// Count of tasks in one status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCount {
    /// Task status.
    pub status: TaskStatus,
    /// Number of tasks in that status.
    pub count: u64,
}

/// Count attributed to a named entity (organization, manager, employee).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedCount {
    /// Display name of the entity.
    pub name: String,
    /// Attributed count.
    pub count: u64,
}

impl NamedCount {
    /// Creates a named count.
    #[must_use]
    pub fn new(name: impl Into<String>, count: u64) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Snapshot of the aggregate counts across the whole store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statistics {
    /// Registered users, admins included.
    pub total_users: u64,
    /// Organizations.
    pub total_organizations: u64,
    /// Tasks in any status.
    pub total_tasks: u64,
    /// Task counts per status, in lifecycle order, including zero counts.
    pub tasks_by_status: Vec<StatusCount>,
    /// Users holding the manager role.
    pub managers: u64,
    /// Users holding the employee role.
    pub employees: u64,
    /// Tasks per organization, every organization listed, by name.
    pub tasks_per_organization: Vec<NamedCount>,
    /// Tasks per current manager, every manager listed, by name.
    pub tasks_per_manager: Vec<NamedCount>,
    /// Completed tasks per current employee with at least one, by name.
    pub completed_per_employee: Vec<NamedCount>,
}
