//! Per-user flow state machine.
//!
//! [`FlowController::handle`] loads the actor's [`FlowState`], consumes one
//! [`Inbound`] event, persists the next state and returns the replies for
//! the actor. Messages for other users go through the
//! [`NotificationDispatcher`] directly.

mod admin;
mod employee;
mod manager;
mod registration;

use super::FlowError;
use super::render::Renderer;
use crate::conversation::{
    domain::{
        Callback, ExpectedInput, FlowState, Inbound, MenuCommand, back_keyboard, home_keyboard,
    },
    ports::FlowStore,
};
use crate::directory::{
    domain::{AccessDenied, Operation, User, UserId, authorize},
    services::RegistryService,
};
use crate::notification::{
    domain::{Button, Keyboard, OutboundMessage},
    ports::Notifier,
    services::NotificationDispatcher,
};
use crate::storage::Store;
use crate::task::services::TaskLifecycleService;
use mockable::Clock;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const EXPIRED: &str = "This button has expired.";
const BACK_HOME: &str = "Back to the main menu.";
const USE_BUTTONS: &str = "Please use the buttons.";
const USE_MENU: &str = "Please choose an action from the menu.";

/// Replies for the actor, or the failure that aborted the step.
pub type FlowReplies = Result<Vec<OutboundMessage>, FlowError>;

/// Conversational flow controller.
pub struct FlowController<S, F, N, C>
where
    S: Store,
    F: FlowStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    registry: RegistryService<S>,
    tasks: TaskLifecycleService<S, S, C>,
    flows: Arc<F>,
    dispatcher: NotificationDispatcher<N>,
    renderer: Renderer,
}

impl<S, F, N, C> FlowController<S, F, N, C>
where
    S: Store,
    F: FlowStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    /// Creates a controller over the registry and task services.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Render`] when a bundled template fails to parse.
    pub fn new(
        registry: RegistryService<S>,
        tasks: TaskLifecycleService<S, S, C>,
        flows: Arc<F>,
        dispatcher: NotificationDispatcher<N>,
    ) -> Result<Self, FlowError> {
        Ok(Self {
            registry,
            tasks,
            flows,
            dispatcher,
            renderer: Renderer::new()?,
        })
    }

    /// Consumes one inbound event from `actor` and returns the replies.
    ///
    /// Failures never escape: they are logged, the actor's flow is cleared
    /// and a plain-language explanation is returned instead.
    pub async fn handle(&self, actor: UserId, inbound: Inbound) -> Vec<OutboundMessage> {
        let result = match inbound {
            Inbound::Start => self.start(actor).await,
            Inbound::Text(text) => self.on_text(actor, &text).await,
            Inbound::Callback(payload) => self.on_callback(actor, &payload).await,
        };
        match result {
            Ok(replies) => replies,
            Err(err) => self.fail(actor, &err).await,
        }
    }

    async fn on_text(&self, actor: UserId, text: &str) -> FlowReplies {
        let command = MenuCommand::from_label(text);
        if command == Some(MenuCommand::Back) {
            return self.go_home(actor, BACK_HOME).await;
        }
        let state = self.flows.load(actor).await?;
        debug!(user = %actor, state = state.name(), "text received");
        match (state.expected_input(), command) {
            (ExpectedInput::Text, _) => self.on_input(actor, state, text).await,
            (ExpectedInput::Button, Some(selected)) => {
                self.flows.clear(actor).await?;
                self.run_command(actor, selected).await
            }
            (ExpectedInput::Button, None) => self.go_home(actor, USE_BUTTONS).await,
            (ExpectedInput::Menu, Some(selected)) => self.run_command(actor, selected).await,
            (ExpectedInput::Menu, None) => self.go_home(actor, USE_MENU).await,
        }
    }

    async fn on_input(&self, actor: UserId, state: FlowState, text: &str) -> FlowReplies {
        match state {
            FlowState::Registration => self.complete_registration(actor, text).await,
            FlowState::CreateOrganization => self.complete_organization_creation(actor, text).await,
            FlowState::DeleteOrganization => {
                self.select_organization_for_deletion(actor, text).await
            }
            FlowState::TaskTitle { employee } => self.accept_task_title(actor, employee, text).await,
            FlowState::TaskDescription { employee, title } => {
                self.complete_task(actor, employee, title, text).await
            }
            FlowState::Broadcast => self.complete_broadcast(actor, text).await,
            _ => self.go_home(actor, USE_MENU).await,
        }
    }

    async fn run_command(&self, actor: UserId, command: MenuCommand) -> FlowReplies {
        debug!(user = %actor, command = command.label(), "menu command");
        match command {
            MenuCommand::Register => self.start_registration(actor).await,
            MenuCommand::Back => self.go_home(actor, BACK_HOME).await,
            MenuCommand::CreateOrganization => self.start_organization_creation(actor).await,
            MenuCommand::DeleteOrganization => self.start_organization_deletion(actor).await,
            MenuCommand::AssignManager => self.start_manager_assignment(actor).await,
            MenuCommand::RemoveManager => self.start_manager_revocation(actor).await,
            MenuCommand::ViewOrganizations => self.show_organizations(actor).await,
            MenuCommand::ViewUsers => self.show_users(actor).await,
            MenuCommand::Statistics => self.show_statistics(actor).await,
            MenuCommand::Broadcast => self.start_broadcast(actor).await,
            MenuCommand::ResetAll => self.start_reset(actor).await,
            MenuCommand::AssignEmployee => self.start_employee_assignment(actor).await,
            MenuCommand::RemoveEmployee => self.start_employee_revocation(actor).await,
            MenuCommand::ViewEmployees => self.show_employees(actor).await,
            MenuCommand::AssignTask => self.start_task_creation(actor).await,
            MenuCommand::ManagedTasks(status) => self.show_managed_tasks(actor, status).await,
            MenuCommand::UpdateTaskStatus => self.start_batch_review(actor).await,
            MenuCommand::AssignedTasks(status) => self.show_assigned_tasks(actor, status).await,
        }
    }

    async fn on_callback(&self, actor: UserId, payload: &str) -> FlowReplies {
        let callback = match payload.parse::<Callback>() {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(user = %actor, error = %err, "rejected button payload");
                return self.go_home(actor, EXPIRED).await;
            }
        };
        if callback.is_back() {
            return self.go_home(actor, BACK_HOME).await;
        }
        if let Callback::ReviewTask(task) = callback {
            return self.start_single_review(actor, task).await;
        }

        let state = self.flows.load(actor).await?;
        debug!(user = %actor, state = state.name(), callback = %callback, "button pressed");
        match (state, callback) {
            (
                FlowState::ConfirmOrganizationDeletion { organization },
                Callback::ConfirmDeleteOrganization(confirmed),
            ) if organization == confirmed => {
                self.complete_organization_deletion(actor, organization)
                    .await
            }
            (FlowState::ConfirmOrganizationDeletion { .. }, Callback::CancelDeleteOrganization) => {
                self.go_home(actor, "Deletion cancelled.").await
            }
            (FlowState::AssignManagerCandidate, Callback::SelectManagerCandidate(candidate)) => {
                self.select_manager_candidate(actor, candidate).await
            }
            (
                FlowState::AssignManagerOrganization { candidate },
                Callback::SelectManagerOrganization(organization),
            ) => {
                self.complete_manager_assignment(actor, candidate, organization)
                    .await
            }
            (FlowState::RevokeManager, Callback::SelectManagerRemoval(target))
            | (FlowState::RevokeEmployee, Callback::SelectEmployeeRemoval(target)) => {
                self.complete_revocation(actor, target).await
            }
            (FlowState::AssignEmployee, Callback::SelectEmployeeCandidate(target)) => {
                self.complete_employee_assignment(actor, target).await
            }
            (FlowState::TaskAssignee, Callback::SelectTaskAssignee(employee)) => {
                self.select_task_assignee(actor, employee).await
            }
            (FlowState::ConfirmReset, Callback::ConfirmReset) => self.complete_reset(actor).await,
            (FlowState::ConfirmReset, Callback::CancelReset) => {
                self.go_home(actor, "Reset cancelled.").await
            }
            (FlowState::StatusReview(review), Callback::SetStatus { status, task })
                if review.current() == Some(task) =>
            {
                self.review_step(actor, review, task, status).await
            }
            (FlowState::StatusReview(_), _) => self.go_home(actor, EXPIRED).await,
            (_, Callback::SetStatus { status, task }) => {
                self.one_off_status(actor, task, status).await
            }
            _ => self.go_home(actor, EXPIRED).await,
        }
    }

    async fn fail(&self, actor: UserId, err: &FlowError) -> Vec<OutboundMessage> {
        if err.is_store_failure() {
            error!(user = %actor, error = %err, "flow step failed");
        } else {
            info!(user = %actor, error = %err, "flow step rejected");
        }
        if let Err(clear_err) = self.flows.clear(actor).await {
            error!(user = %actor, error = %clear_err, "failed to clear flow state");
        }
        let keyboard = match self.home_keyboard_of(actor).await {
            Ok(keyboard) => keyboard,
            Err(lookup_err) => {
                debug!(user = %actor, error = %lookup_err, "home keyboard unavailable");
                Keyboard::Unchanged
            }
        };
        vec![OutboundMessage::new(err.user_message()).with_keyboard(keyboard)]
    }

    /// Clears the actor's flow and shows the role-appropriate menu.
    async fn go_home(&self, actor: UserId, text: &str) -> FlowReplies {
        self.flows.clear(actor).await?;
        let keyboard = self.home_keyboard_of(actor).await?;
        Ok(vec![OutboundMessage::new(text).with_keyboard(keyboard)])
    }

    /// Clears the actor's flow and sends rendered `text` with the menu.
    ///
    /// `text` reports a committed change, so it is sent even when the menu
    /// cannot be loaded.
    async fn finish(&self, actor: UserId, text: String) -> FlowReplies {
        self.flows.clear(actor).await?;
        let message = OutboundMessage::new(text);
        match self.home_keyboard_of(actor).await {
            Ok(keyboard) => Ok(vec![message.with_keyboard(keyboard)]),
            Err(err) => {
                warn!(user = %actor, error = %err, "menu lookup failed");
                Ok(vec![message])
            }
        }
    }

    async fn home_keyboard_of(&self, actor: UserId) -> Result<Keyboard, FlowError> {
        let user = self.registry.find_user(actor).await?;
        Ok(home_keyboard(user.as_ref().map(User::role)))
    }

    /// Loads the actor fresh and checks `operation` against the stored role.
    async fn require(&self, actor: UserId, operation: Operation) -> Result<User, FlowError> {
        let user = self.registry.find_user(actor).await?;
        authorize(user.as_ref(), operation)?;
        user.ok_or(FlowError::Forbidden(AccessDenied::Unregistered(operation)))
    }

    /// Saves `state` and prompts for text with only the back button shown.
    async fn prompt(&self, actor: UserId, state: FlowState, text: &str) -> FlowReplies {
        self.flows.save(actor, state).await?;
        Ok(vec![OutboundMessage::new(text).with_keyboard(back_keyboard())])
    }

    /// Saves `state` and offers one inline button per choice plus back.
    async fn choose(
        &self,
        actor: UserId,
        state: FlowState,
        text: String,
        choices: Vec<Button>,
    ) -> FlowReplies {
        self.flows.save(actor, state).await?;
        let buttons = choices
            .into_iter()
            .chain([Button::new("⬅️ Back", Callback::CancelAction.to_string())]);
        Ok(vec![
            OutboundMessage::new(text).with_keyboard(Keyboard::column(buttons)),
        ])
    }
}

fn user_button(user: &User, callback: Callback) -> Button {
    Button::new(
        format!("{} (ID: {})", user.full_name().as_str(), user.id()),
        callback.to_string(),
    )
}
