//! Authorization predicates for privileged operations.
//!
//! Every privileged action names an [`Operation`]. Whether a role may perform
//! it is decided by [`Operation::permits`] alone, evaluated against a user
//! freshly loaded from the store.

use super::{Role, User};
use std::fmt;
use thiserror::Error;

/// Privileged action a user may attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Create an organization.
    CreateOrganization,
    /// Delete an organization and demote its members.
    DeleteOrganization,
    /// List all organizations.
    ListOrganizations,
    /// Grant the manager role.
    AssignManager,
    /// Revoke the manager role.
    RevokeManager,
    /// List all managers.
    ListManagers,
    /// List every other registered user.
    ListUsers,
    /// Read aggregate counts.
    ViewStatistics,
    /// Send a message to every other user.
    Broadcast,
    /// Delete all tasks, organizations and non-admin users.
    ResetAll,
    /// Grant the employee role within the actor's organization.
    AssignEmployee,
    /// Revoke the employee role within the actor's organization.
    RevokeEmployee,
    /// List employees of the actor's organization.
    ListEmployees,
    /// Hand out a task.
    CreateTask,
    /// List tasks the actor handed out.
    ListManagedTasks,
    /// Change the status of an assigned task.
    UpdateTaskStatus,
    /// List tasks assigned to the actor.
    ListAssignedTasks,
}

impl Operation {
    /// Returns whether `role` may perform this operation.
    #[must_use]
    pub const fn permits(self, role: Role) -> bool {
        match self {
            Self::CreateOrganization
            | Self::DeleteOrganization
            | Self::ListOrganizations
            | Self::AssignManager
            | Self::RevokeManager
            | Self::ListManagers
            | Self::ListUsers
            | Self::ViewStatistics
            | Self::Broadcast
            | Self::ResetAll => matches!(role, Role::Admin),
            Self::AssignEmployee
            | Self::RevokeEmployee
            | Self::ListEmployees
            | Self::CreateTask
            | Self::ListManagedTasks => matches!(role, Role::Manager),
            Self::UpdateTaskStatus | Self::ListAssignedTasks => matches!(role, Role::Employee),
        }
    }

    /// Returns a short human-readable description.
    #[must_use]
    pub const fn describe(self) -> &'static str {
        match self {
            Self::CreateOrganization => "create organizations",
            Self::DeleteOrganization => "delete organizations",
            Self::ListOrganizations => "view organizations",
            Self::AssignManager => "assign managers",
            Self::RevokeManager => "remove managers",
            Self::ListManagers => "view managers",
            Self::ListUsers => "view users",
            Self::ViewStatistics => "view statistics",
            Self::Broadcast => "broadcast messages",
            Self::ResetAll => "reset all data",
            Self::AssignEmployee => "assign employees",
            Self::RevokeEmployee => "remove employees",
            Self::ListEmployees => "view employees",
            Self::CreateTask => "assign tasks",
            Self::ListManagedTasks => "view assigned tasks",
            Self::UpdateTaskStatus => "change task status",
            Self::ListAssignedTasks => "view your tasks",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.describe())
    }
}

/// Reason an operation was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// The actor has not registered.
    #[error("unregistered users cannot {0}")]
    Unregistered(Operation),
    /// The actor's role does not permit the operation.
    #[error("role {role} cannot {operation}")]
    Role {
        /// Role held by the actor.
        role: Role,
        /// Operation that was refused.
        operation: Operation,
    },
}

/// Checks `operation` against an actor loaded from the store.
///
/// # Errors
///
/// Returns [`AccessDenied`] when the actor is unregistered or the role does
/// not permit the operation.
pub fn authorize(actor: Option<&User>, operation: Operation) -> Result<&User, AccessDenied> {
    let user = actor.ok_or(AccessDenied::Unregistered(operation))?;
    let role = user.role();
    if operation.permits(role) {
        Ok(user)
    } else {
        Err(AccessDenied::Role { role, operation })
    }
}
