//! Inline button payloads.
//!
//! Payloads follow `<action>_<subtype>_<id>`: the trailing numeric id is
//! split off at the last underscore and the remaining prefix selects the
//! action. A few actions carry no id at all.

use crate::conversation::domain::ParseCallbackError;
use crate::directory::domain::{OrganizationId, UserId};
use crate::task::domain::{TaskId, TaskStatus};
use std::fmt;
use std::str::FromStr;

const CANCEL_ACTION: &str = "cancel_action";
const CANCEL_STATUS_CHANGE: &str = "cancel_task_status_change";
const CANCEL_DELETE_ORG: &str = "cancel_delete_org";
const CONFIRM_RESET: &str = "confirm_reset";
const CANCEL_RESET: &str = "cancel_reset";

const CONFIRM_DELETE_ORG: &str = "confirm_delete_org";
const SELECT_MANAGER_CANDIDATE: &str = "select_user_assign_manager";
const SELECT_MANAGER_ORG: &str = "select_org_assign_manager";
const SELECT_MANAGER_REMOVAL: &str = "select_manager_remove";
const SELECT_EMPLOYEE_CANDIDATE: &str = "select_user_assign_employee";
const SELECT_EMPLOYEE_REMOVAL: &str = "select_employee_remove";
const SELECT_TASK_ASSIGNEE: &str = "select_employee_assign_task";
const REVIEW_TASK: &str = "change_task_direct";
const STATUS_PREFIX: &str = "status_";

/// Decoded inline button press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Callback {
    /// Generic back button of selection lists.
    CancelAction,
    /// Back button of the status review.
    CancelStatusChange,
    /// Confirms deleting an organization.
    ConfirmDeleteOrganization(OrganizationId),
    /// Keeps the organization.
    CancelDeleteOrganization,
    /// Picks the plain user to promote to manager.
    SelectManagerCandidate(UserId),
    /// Picks the organization for the new manager.
    SelectManagerOrganization(OrganizationId),
    /// Picks the manager to demote.
    SelectManagerRemoval(UserId),
    /// Picks the plain user to promote to employee.
    SelectEmployeeCandidate(UserId),
    /// Picks the employee to demote.
    SelectEmployeeRemoval(UserId),
    /// Picks the employee receiving a new task.
    SelectTaskAssignee(UserId),
    /// Confirms deleting all data.
    ConfirmReset,
    /// Keeps all data.
    CancelReset,
    /// Opens the status review for one task.
    ReviewTask(TaskId),
    /// Sets a task status.
    SetStatus {
        /// Requested status.
        status: TaskStatus,
        /// Task to change.
        task: TaskId,
    },
}

impl Callback {
    /// Returns whether the button returns to the home state from anywhere.
    #[must_use]
    pub const fn is_back(self) -> bool {
        matches!(self, Self::CancelAction | Self::CancelStatusChange)
    }
}

impl FromStr for Callback {
    type Err = ParseCallbackError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        match payload {
            CANCEL_ACTION => return Ok(Self::CancelAction),
            CANCEL_STATUS_CHANGE => return Ok(Self::CancelStatusChange),
            CANCEL_DELETE_ORG => return Ok(Self::CancelDeleteOrganization),
            CONFIRM_RESET => return Ok(Self::ConfirmReset),
            CANCEL_RESET => return Ok(Self::CancelReset),
            _ => {}
        }

        let malformed = || ParseCallbackError(payload.to_owned());
        let (prefix, raw_id) = payload.rsplit_once('_').ok_or_else(malformed)?;
        let id = raw_id.parse::<i64>().map_err(|_| malformed())?;

        let callback = match prefix {
            CONFIRM_DELETE_ORG => Self::ConfirmDeleteOrganization(OrganizationId::new(id)),
            SELECT_MANAGER_CANDIDATE => Self::SelectManagerCandidate(UserId::new(id)),
            SELECT_MANAGER_ORG => Self::SelectManagerOrganization(OrganizationId::new(id)),
            SELECT_MANAGER_REMOVAL => Self::SelectManagerRemoval(UserId::new(id)),
            SELECT_EMPLOYEE_CANDIDATE => Self::SelectEmployeeCandidate(UserId::new(id)),
            SELECT_EMPLOYEE_REMOVAL => Self::SelectEmployeeRemoval(UserId::new(id)),
            SELECT_TASK_ASSIGNEE => Self::SelectTaskAssignee(UserId::new(id)),
            REVIEW_TASK => Self::ReviewTask(TaskId::new(id)),
            other => {
                let status = other
                    .strip_prefix(STATUS_PREFIX)
                    .and_then(|raw| TaskStatus::try_from(raw).ok())
                    .ok_or_else(malformed)?;
                Self::SetStatus {
                    status,
                    task: TaskId::new(id),
                }
            }
        };
        Ok(callback)
    }
}

impl fmt::Display for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CancelAction => f.write_str(CANCEL_ACTION),
            Self::CancelStatusChange => f.write_str(CANCEL_STATUS_CHANGE),
            Self::CancelDeleteOrganization => f.write_str(CANCEL_DELETE_ORG),
            Self::ConfirmReset => f.write_str(CONFIRM_RESET),
            Self::CancelReset => f.write_str(CANCEL_RESET),
            Self::ConfirmDeleteOrganization(id) => write!(f, "{CONFIRM_DELETE_ORG}_{id}"),
            Self::SelectManagerCandidate(id) => write!(f, "{SELECT_MANAGER_CANDIDATE}_{id}"),
            Self::SelectManagerOrganization(id) => write!(f, "{SELECT_MANAGER_ORG}_{id}"),
            Self::SelectManagerRemoval(id) => write!(f, "{SELECT_MANAGER_REMOVAL}_{id}"),
            Self::SelectEmployeeCandidate(id) => write!(f, "{SELECT_EMPLOYEE_CANDIDATE}_{id}"),
            Self::SelectEmployeeRemoval(id) => write!(f, "{SELECT_EMPLOYEE_REMOVAL}_{id}"),
            Self::SelectTaskAssignee(id) => write!(f, "{SELECT_TASK_ASSIGNEE}_{id}"),
            Self::ReviewTask(id) => write!(f, "{REVIEW_TASK}_{id}"),
            Self::SetStatus { status, task } => write!(f, "{STATUS_PREFIX}{status}_{task}"),
        }
    }
}
