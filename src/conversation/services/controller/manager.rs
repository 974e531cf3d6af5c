//! Manager flows: employees and task hand-out.

use super::{FlowController, FlowReplies, user_button};
use crate::conversation::{
    domain::{Callback, FlowState},
    ports::FlowStore,
    services::{FlowError, render::status_label},
};
use crate::directory::{
    domain::{Role, UserId},
    services::AssignRoleRequest,
};
use crate::notification::{
    domain::{Button, Keyboard, OutboundMessage},
    ports::Notifier,
};
use crate::storage::Store;
use crate::task::{
    domain::{TaskDescription, TaskStatus, TaskTitle},
    services::{CreateTaskRequest, TERMINAL_LISTING_LIMIT},
};
use mockable::Clock;
use tracing::{info, warn};

const NO_EMPLOYEES: &str = "Your organization has no employees.";
const ASK_TITLE: &str = "Enter the task title.";
const INVALID_TITLE: &str =
    "The title must not be empty or longer than 255 characters. Enter the title again.";
const ASK_DESCRIPTION: &str = "Enter the task description.";
const INVALID_DESCRIPTION: &str = "The description must not be empty. Enter it again.";

impl<S, F, N, C> FlowController<S, F, N, C>
where
    S: Store,
    F: FlowStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    pub(super) async fn start_employee_assignment(&self, actor: UserId) -> FlowReplies {
        let candidates = self.registry.list_candidates(actor).await?;
        if candidates.is_empty() {
            return self
                .go_home(actor, "There are no registered users without a role.")
                .await;
        }
        let choices = candidates
            .iter()
            .map(|user| user_button(user, Callback::SelectEmployeeCandidate(user.id())))
            .collect();
        self.choose(
            actor,
            FlowState::AssignEmployee,
            "Choose the user to add as an employee.".to_owned(),
            choices,
        )
        .await
    }

    pub(super) async fn complete_employee_assignment(
        &self,
        actor: UserId,
        target: UserId,
    ) -> FlowReplies {
        let request = AssignRoleRequest::new(actor, target, Role::Employee);
        let change = self.registry.assign_role(request).await?;
        self.announce_role_change(actor, &change, true).await
    }

    pub(super) async fn start_employee_revocation(&self, actor: UserId) -> FlowReplies {
        let employees = self.registry.list_employees(actor).await?;
        if employees.is_empty() {
            return self.go_home(actor, NO_EMPLOYEES).await;
        }
        let choices = employees
            .iter()
            .map(|user| user_button(user, Callback::SelectEmployeeRemoval(user.id())))
            .collect();
        self.choose(
            actor,
            FlowState::RevokeEmployee,
            "Choose the employee to remove.".to_owned(),
            choices,
        )
        .await
    }

    pub(super) async fn show_employees(&self, actor: UserId) -> FlowReplies {
        let employees = self.registry.list_employees(actor).await?;
        let listing = self
            .renderer
            .users("Employees", NO_EMPLOYEES, &employees, &[])?;
        Ok(vec![OutboundMessage::new(listing)])
    }

    pub(super) async fn start_task_creation(&self, actor: UserId) -> FlowReplies {
        let employees = self.registry.list_employees(actor).await?;
        if employees.is_empty() {
            return self
                .go_home(actor, "Your organization has no employees. Add one first.")
                .await;
        }
        let choices = employees
            .iter()
            .map(|user| user_button(user, Callback::SelectTaskAssignee(user.id())))
            .collect();
        self.choose(
            actor,
            FlowState::TaskAssignee,
            "Choose the employee who will receive the task.".to_owned(),
            choices,
        )
        .await
    }

    pub(super) async fn select_task_assignee(
        &self,
        actor: UserId,
        employee: UserId,
    ) -> FlowReplies {
        self.prompt(actor, FlowState::TaskTitle { employee }, ASK_TITLE)
            .await
    }

    pub(super) async fn accept_task_title(
        &self,
        actor: UserId,
        employee: UserId,
        text: &str,
    ) -> FlowReplies {
        let Ok(title) = TaskTitle::new(text) else {
            return Ok(vec![OutboundMessage::new(INVALID_TITLE)]);
        };
        self.prompt(
            actor,
            FlowState::TaskDescription { employee, title },
            ASK_DESCRIPTION,
        )
        .await
    }

    pub(super) async fn complete_task(
        &self,
        actor: UserId,
        employee: UserId,
        title: TaskTitle,
        text: &str,
    ) -> FlowReplies {
        if TaskDescription::new(text).is_err() {
            return Ok(vec![OutboundMessage::new(INVALID_DESCRIPTION)]);
        }
        let request = CreateTaskRequest::new(actor, employee, title.as_str(), text);
        let task = self.tasks.create_task(request).await?;

        let manager_name = self.display_name(actor).await;
        let employee_name = self.display_name(employee).await;
        let notice = OutboundMessage::new(self.renderer.task_assigned(&task, &manager_name)?)
            .with_keyboard(Keyboard::column([Button::new(
                "Change status",
                Callback::ReviewTask(task.id()).to_string(),
            )]));
        let delivered = self.dispatcher.send(employee, &notice).await.is_ok();
        if !delivered {
            info!(task = %task.id(), employee = %employee, "task notice not delivered");
        }

        let confirmation = self
            .renderer
            .task_created(&task, &employee_name, delivered)?;
        self.finish(actor, confirmation).await
    }

    pub(super) async fn show_managed_tasks(
        &self,
        actor: UserId,
        status: Option<TaskStatus>,
    ) -> FlowReplies {
        let tasks = self.tasks.list_managed(actor, status).await?;
        if tasks.is_empty() {
            return Ok(vec![OutboundMessage::new("No tasks found.")]);
        }
        let heading = status.map_or_else(
            || "All tasks".to_owned(),
            |filter| format!("{} tasks", status_label(filter)),
        );
        let truncated =
            status.is_some_and(TaskStatus::is_terminal) && tasks.len() >= TERMINAL_LISTING_LIMIT;
        let listing = self.renderer.task_list(&heading, &tasks, true, truncated)?;
        Ok(vec![OutboundMessage::new(listing)])
    }

    /// Returns the registered name of `user`, or a placeholder.
    ///
    /// Runs after changes have committed, so a failed lookup falls back to
    /// the placeholder instead of failing the step.
    pub(super) async fn display_name(&self, user: UserId) -> String {
        match self.registry.find_user(user).await {
            Ok(Some(registered)) => registered.full_name().as_str().to_owned(),
            Ok(None) => format!("user {user}"),
            Err(err) => {
                warn!(user = %user, error = %err, "name lookup failed");
                format!("user {user}")
            }
        }
    }
}
