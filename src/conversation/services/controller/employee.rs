//! Employee flows: task listings and the status review.

use super::{FlowController, FlowReplies};
use crate::conversation::{
    domain::{Callback, FlowState, ReviewMode, StatusReview, home_keyboard},
    ports::FlowStore,
    services::{
        FlowError,
        render::{StatusOutcome, status_label},
    },
};
use crate::directory::domain::{Role, UserId};
use crate::notification::{
    domain::{Button, Keyboard, OutboundMessage},
    ports::Notifier,
};
use crate::storage::Store;
use crate::task::{
    domain::{Task, TaskId, TaskStatus},
    services::{StatusUpdate, TERMINAL_LISTING_LIMIT, TaskLifecycleError},
};
use mockable::Clock;
use tracing::debug;

const STALE_TASK: &str = "This task no longer exists or its status has changed.";

impl<S, F, N, C> FlowController<S, F, N, C>
where
    S: Store,
    F: FlowStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    pub(super) async fn show_assigned_tasks(
        &self,
        actor: UserId,
        status: TaskStatus,
    ) -> FlowReplies {
        let tasks = self.tasks.list_assigned(actor, Some(status)).await?;
        if tasks.is_empty() {
            return Ok(vec![OutboundMessage::new(format!(
                "You have no tasks with status {}.",
                status_label(status)
            ))]);
        }
        let heading = format!("My {} tasks", status_label(status));
        let truncated = status.is_terminal() && tasks.len() >= TERMINAL_LISTING_LIMIT;
        let listing = self.renderer.task_list(&heading, &tasks, false, truncated)?;
        Ok(vec![OutboundMessage::new(listing)])
    }

    /// Captures the employee's pending tasks and shows the first one.
    pub(super) async fn start_batch_review(&self, actor: UserId) -> FlowReplies {
        let queue = self.tasks.pending_queue(actor).await?;
        if queue.is_empty() {
            return self
                .go_home(actor, "You have no new or accepted tasks.")
                .await;
        }
        self.present_next(actor, StatusReview::batch(queue)).await
    }

    /// Opens the review for one task from its notification.
    pub(super) async fn start_single_review(&self, actor: UserId, task: TaskId) -> FlowReplies {
        if self.reviewable(actor, task).await?.is_none() {
            return self.go_home(actor, STALE_TASK).await;
        }
        self.present_next(actor, StatusReview::single(task)).await
    }

    /// Applies the pressed status to the task under the cursor and moves on.
    pub(super) async fn review_step(
        &self,
        actor: UserId,
        mut review: StatusReview,
        task: TaskId,
        status: TaskStatus,
    ) -> FlowReplies {
        let (outcome, updated) = self.apply_status(actor, task, status).await?;
        review.advance(updated);
        let mut replies = vec![outcome];
        replies.extend(self.present_next(actor, review).await?);
        Ok(replies)
    }

    /// Applies a status button pressed outside a review.
    pub(super) async fn one_off_status(
        &self,
        actor: UserId,
        task: TaskId,
        status: TaskStatus,
    ) -> FlowReplies {
        let (outcome, _) = self.apply_status(actor, task, status).await?;
        Ok(vec![outcome])
    }

    /// Shows the next task still pending for the actor, skipping tasks that
    /// became terminal or were reassigned since capture.
    async fn present_next(&self, actor: UserId, mut review: StatusReview) -> FlowReplies {
        while let Some(id) = review.current() {
            if let Some(task) = self.reviewable(actor, id).await? {
                let card = self.review_card(&task, review.mode()).await?;
                self.flows
                    .save(actor, FlowState::StatusReview(review))
                    .await?;
                return Ok(vec![card]);
            }
            debug!(user = %actor, task = %id, "skipping task no longer pending");
            review.advance(false);
        }
        self.finish_review(actor, &review).await
    }

    async fn finish_review(&self, actor: UserId, review: &StatusReview) -> FlowReplies {
        self.flows.clear(actor).await?;
        match review.mode() {
            ReviewMode::Single => Ok(Vec::new()),
            ReviewMode::Batch => {
                let summary = format!(
                    "All pending tasks processed. Updated: {}, skipped: {}.",
                    review.updated(),
                    review.skipped()
                );
                Ok(vec![
                    OutboundMessage::new(summary).with_keyboard(home_keyboard(Some(Role::Employee))),
                ])
            }
        }
    }

    /// Loads `id` if it is still assigned to the actor and not terminal.
    async fn reviewable(&self, actor: UserId, id: TaskId) -> Result<Option<Task>, FlowError> {
        let task = self.tasks.find_task(id).await?;
        Ok(task.filter(|found| found.employee() == actor && !found.status().is_terminal()))
    }

    async fn review_card(&self, task: &Task, mode: ReviewMode) -> Result<OutboundMessage, FlowError> {
        let manager = self.display_name(task.manager()).await;
        let text = self.renderer.task_card(task, &manager)?;
        let mut buttons: Vec<Button> = task
            .status()
            .next_choices()
            .into_iter()
            .map(|status| {
                Button::new(
                    status_label(status),
                    Callback::SetStatus {
                        status,
                        task: task.id(),
                    }
                    .to_string(),
                )
            })
            .collect();
        if mode == ReviewMode::Batch {
            buttons.push(Button::new(
                "⬅️ Back",
                Callback::CancelStatusChange.to_string(),
            ));
        }
        Ok(OutboundMessage::new(text).with_keyboard(Keyboard::column(buttons)))
    }

    /// Runs the status change and renders its outcome.
    ///
    /// Returns the message for the actor and whether the status changed.
    async fn apply_status(
        &self,
        actor: UserId,
        id: TaskId,
        status: TaskStatus,
    ) -> Result<(OutboundMessage, bool), FlowError> {
        let (task, outcome) = match self.tasks.set_status(id, status, actor).await {
            Ok(StatusUpdate::Changed { task, previous }) => {
                self.notify_manager(&task, previous).await?;
                (task, StatusOutcome::Changed { to: status })
            }
            Ok(StatusUpdate::AlreadyInState { task }) => {
                let current = task.status();
                (task, StatusOutcome::Already { status: current })
            }
            Err(TaskLifecycleError::InvalidTransition { from, to, .. }) => (
                self.stored_task(id).await?,
                StatusOutcome::refused(from, to),
            ),
            Err(TaskLifecycleError::Frozen(_)) => {
                (self.stored_task(id).await?, StatusOutcome::Frozen)
            }
            Err(err) => return Err(err.into()),
        };
        let updated = matches!(outcome, StatusOutcome::Changed { .. });
        let text = self.renderer.status_outcome(&task, outcome)?;
        Ok((OutboundMessage::new(text), updated))
    }

    async fn stored_task(&self, id: TaskId) -> Result<Task, FlowError> {
        self.tasks
            .find_task(id)
            .await?
            .ok_or_else(|| TaskLifecycleError::NotFound(id).into())
    }

    async fn notify_manager(&self, task: &Task, previous: TaskStatus) -> Result<(), FlowError> {
        let employee = self.display_name(task.employee()).await;
        let text = self.renderer.status_changed(task, &employee, previous)?;
        if self
            .dispatcher
            .send(task.manager(), &OutboundMessage::new(text))
            .await
            .is_err()
        {
            debug!(task = %task.id(), manager = %task.manager(), "status notice not delivered");
        }
        Ok(())
    }
}
