//! Reply-keyboard menu commands and per-role layouts.

use crate::directory::domain::Role;
use crate::notification::domain::Keyboard;
use crate::task::domain::TaskStatus;

/// Command selected from a reply-keyboard menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuCommand {
    /// Starts registration.
    Register,
    /// Returns to the home state.
    Back,
    /// Admin: create an organization.
    CreateOrganization,
    /// Admin: delete an organization.
    DeleteOrganization,
    /// Admin: promote a plain user to manager.
    AssignManager,
    /// Admin: demote a manager.
    RemoveManager,
    /// Admin: list organizations.
    ViewOrganizations,
    /// Admin: list users.
    ViewUsers,
    /// Admin: aggregate statistics.
    Statistics,
    /// Admin: message every user.
    Broadcast,
    /// Admin: delete all data.
    ResetAll,
    /// Manager: promote a plain user to employee.
    AssignEmployee,
    /// Manager: demote an employee.
    RemoveEmployee,
    /// Manager: list employees.
    ViewEmployees,
    /// Manager: hand out a task.
    AssignTask,
    /// Manager: list handed-out tasks, optionally by status.
    ManagedTasks(Option<TaskStatus>),
    /// Employee: review pending tasks one by one.
    UpdateTaskStatus,
    /// Employee: list own tasks of one status.
    AssignedTasks(TaskStatus),
}

const ALL: [MenuCommand; 25] = [
    MenuCommand::Register,
    MenuCommand::Back,
    MenuCommand::CreateOrganization,
    MenuCommand::DeleteOrganization,
    MenuCommand::AssignManager,
    MenuCommand::RemoveManager,
    MenuCommand::ViewOrganizations,
    MenuCommand::ViewUsers,
    MenuCommand::Statistics,
    MenuCommand::Broadcast,
    MenuCommand::ResetAll,
    MenuCommand::AssignEmployee,
    MenuCommand::RemoveEmployee,
    MenuCommand::ViewEmployees,
    MenuCommand::AssignTask,
    MenuCommand::ManagedTasks(None),
    MenuCommand::ManagedTasks(Some(TaskStatus::New)),
    MenuCommand::ManagedTasks(Some(TaskStatus::Accepted)),
    MenuCommand::ManagedTasks(Some(TaskStatus::Completed)),
    MenuCommand::ManagedTasks(Some(TaskStatus::Rejected)),
    MenuCommand::UpdateTaskStatus,
    MenuCommand::AssignedTasks(TaskStatus::New),
    MenuCommand::AssignedTasks(TaskStatus::Accepted),
    MenuCommand::AssignedTasks(TaskStatus::Completed),
    MenuCommand::AssignedTasks(TaskStatus::Rejected),
];

impl MenuCommand {
    /// Returns the button label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Register => "Register",
            Self::Back => "Back",
            Self::CreateOrganization => "Create organization",
            Self::DeleteOrganization => "Delete organization",
            Self::AssignManager => "Assign manager",
            Self::RemoveManager => "Remove manager",
            Self::ViewOrganizations => "View organizations",
            Self::ViewUsers => "View users",
            Self::Statistics => "Statistics",
            Self::Broadcast => "Broadcast",
            Self::ResetAll => "Reset all data",
            Self::AssignEmployee => "Assign employee",
            Self::RemoveEmployee => "Remove employee",
            Self::ViewEmployees => "View employees",
            Self::AssignTask => "Assign task",
            Self::ManagedTasks(None) => "All tasks",
            Self::ManagedTasks(Some(TaskStatus::New)) => "New tasks",
            Self::ManagedTasks(Some(TaskStatus::Accepted)) => "Accepted tasks",
            Self::ManagedTasks(Some(TaskStatus::Completed)) => "Completed tasks",
            Self::ManagedTasks(Some(TaskStatus::Rejected)) => "Rejected tasks",
            Self::UpdateTaskStatus => "Update task status",
            Self::AssignedTasks(TaskStatus::New) => "My new tasks",
            Self::AssignedTasks(TaskStatus::Accepted) => "My accepted tasks",
            Self::AssignedTasks(TaskStatus::Completed) => "My completed tasks",
            Self::AssignedTasks(TaskStatus::Rejected) => "My rejected tasks",
        }
    }

    /// Looks up the command whose label matches `text` exactly.
    #[must_use]
    pub fn from_label(text: &str) -> Option<Self> {
        ALL.into_iter().find(|command| command.label() == text.trim())
    }
}

/// Returns the home keyboard for a user with `role`, or the registration
/// keyboard for unregistered users.
#[must_use]
pub fn home_keyboard(role: Option<Role>) -> Keyboard {
    let rows: Vec<Vec<MenuCommand>> = match role {
        None => vec![vec![MenuCommand::Register]],
        Some(Role::User) => return Keyboard::Remove,
        Some(Role::Admin) => vec![
            vec![
                MenuCommand::CreateOrganization,
                MenuCommand::DeleteOrganization,
            ],
            vec![MenuCommand::AssignManager, MenuCommand::RemoveManager],
            vec![MenuCommand::ViewOrganizations, MenuCommand::ViewUsers],
            vec![MenuCommand::Statistics, MenuCommand::Broadcast],
            vec![MenuCommand::ResetAll],
        ],
        Some(Role::Manager) => vec![
            vec![
                MenuCommand::AssignEmployee,
                MenuCommand::RemoveEmployee,
                MenuCommand::ViewEmployees,
            ],
            vec![MenuCommand::AssignTask, MenuCommand::ManagedTasks(None)],
            vec![
                MenuCommand::ManagedTasks(Some(TaskStatus::New)),
                MenuCommand::ManagedTasks(Some(TaskStatus::Accepted)),
            ],
            vec![
                MenuCommand::ManagedTasks(Some(TaskStatus::Completed)),
                MenuCommand::ManagedTasks(Some(TaskStatus::Rejected)),
            ],
        ],
        Some(Role::Employee) => vec![
            vec![MenuCommand::UpdateTaskStatus],
            vec![
                MenuCommand::AssignedTasks(TaskStatus::New),
                MenuCommand::AssignedTasks(TaskStatus::Accepted),
            ],
            vec![
                MenuCommand::AssignedTasks(TaskStatus::Completed),
                MenuCommand::AssignedTasks(TaskStatus::Rejected),
            ],
        ],
    };
    labels(rows)
}

/// Returns a keyboard holding only the back button.
#[must_use]
pub fn back_keyboard() -> Keyboard {
    labels(vec![vec![MenuCommand::Back]])
}

fn labels(rows: Vec<Vec<MenuCommand>>) -> Keyboard {
    Keyboard::Reply(
        rows.into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|command| command.label().to_owned())
                    .collect()
            })
            .collect(),
    )
}
