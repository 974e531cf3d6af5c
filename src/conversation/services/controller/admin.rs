//! Administrator flows: organizations, managers, broadcast and reset.

use super::{FlowController, FlowReplies, user_button};
use crate::conversation::{
    domain::{Callback, FlowState, back_keyboard, home_keyboard},
    ports::FlowStore,
    services::render::{Audience, broadcast_summary},
};
use crate::directory::{
    domain::{Operation, OrganizationId, Role, UserId},
    services::{AssignRoleRequest, RegistryError, RoleChange},
};
use crate::notification::{
    domain::{Button, Keyboard, OutboundMessage},
    ports::Notifier,
};
use crate::storage::Store;
use crate::telemetry::AUDIT_TARGET;
use mockable::Clock;
use tracing::info;

const ASK_ORGANIZATION_NAME: &str = "Enter the name of the new organization.";
const DUPLICATE_ORGANIZATION_NAME: &str =
    "An organization with that name already exists. Enter another name.";
const INVALID_ORGANIZATION_NAME: &str =
    "The name must not be empty or longer than 255 characters. Enter another name.";
const ASK_ORGANIZATION_ID: &str = "Enter the ID of the organization to delete.";
const ASK_BROADCAST: &str = "Enter the message to send to every user.";

impl<S, F, N, C> FlowController<S, F, N, C>
where
    S: Store,
    F: FlowStore,
    N: Notifier,
    C: Clock + Send + Sync,
{
    pub(super) async fn start_organization_creation(&self, actor: UserId) -> FlowReplies {
        self.require(actor, Operation::CreateOrganization).await?;
        self.prompt(actor, FlowState::CreateOrganization, ASK_ORGANIZATION_NAME)
            .await
    }

    pub(super) async fn complete_organization_creation(
        &self,
        actor: UserId,
        text: &str,
    ) -> FlowReplies {
        match self.registry.create_organization(actor, text).await {
            Ok(organization) => {
                let created = self.renderer.organization_created(&organization)?;
                self.finish(actor, created).await
            }
            Err(RegistryError::DuplicateName(_)) => {
                Ok(vec![OutboundMessage::new(DUPLICATE_ORGANIZATION_NAME)])
            }
            Err(RegistryError::Domain(_)) => {
                Ok(vec![OutboundMessage::new(INVALID_ORGANIZATION_NAME)])
            }
            Err(err) => Err(err.into()),
        }
    }

    pub(super) async fn start_organization_deletion(&self, actor: UserId) -> FlowReplies {
        let organizations = self.registry.list_organizations(actor).await?;
        if organizations.is_empty() {
            return self
                .go_home(actor, "There are no organizations to delete.")
                .await;
        }
        let listing = self.renderer.organizations(&organizations)?;
        self.flows.save(actor, FlowState::DeleteOrganization).await?;
        Ok(vec![
            OutboundMessage::new(listing),
            OutboundMessage::new(ASK_ORGANIZATION_ID)
                .with_keyboard(back_keyboard()),
        ])
    }

    pub(super) async fn select_organization_for_deletion(
        &self,
        actor: UserId,
        text: &str,
    ) -> FlowReplies {
        let Ok(raw_id) = text.trim().parse::<i64>() else {
            return Ok(vec![OutboundMessage::new(
                "Enter a numeric organization ID.",
            )]);
        };
        self.require(actor, Operation::DeleteOrganization).await?;
        let id = OrganizationId::new(raw_id);
        let organization = self
            .registry
            .find_organization(id)
            .await?
            .ok_or(RegistryError::OrganizationNotFound(id))?;

        self.flows
            .save(actor, FlowState::ConfirmOrganizationDeletion { organization: id })
            .await?;
        let question = self.renderer.confirm_organization_deletion(&organization)?;
        let buttons = vec![
            Button::new(
                "Yes, delete",
                Callback::ConfirmDeleteOrganization(id).to_string(),
            ),
            Button::new("Cancel", Callback::CancelDeleteOrganization.to_string()),
        ];
        Ok(vec![
            OutboundMessage::new(question).with_keyboard(Keyboard::Inline(vec![buttons])),
        ])
    }

    pub(super) async fn complete_organization_deletion(
        &self,
        actor: UserId,
        id: OrganizationId,
    ) -> FlowReplies {
        self.require(actor, Operation::DeleteOrganization).await?;
        let organization = self
            .registry
            .find_organization(id)
            .await?
            .ok_or(RegistryError::OrganizationNotFound(id))?;
        let removal = self.registry.delete_organization(actor, id).await?;

        let notice = OutboundMessage::new(self.renderer.organization_member_notice(&organization)?)
            .with_keyboard(home_keyboard(Some(Role::User)));
        self.dispatcher.broadcast(&removal.demoted, &notice).await;

        let summary = self.renderer.organization_deleted(
            &organization,
            removal.demoted.len(),
            removal.removed_tasks,
        )?;
        self.finish(actor, summary).await
    }

    pub(super) async fn start_manager_assignment(&self, actor: UserId) -> FlowReplies {
        let candidates = self.registry.list_candidates(actor).await?;
        if candidates.is_empty() {
            return self
                .go_home(actor, "There are no registered users without a role.")
                .await;
        }
        let choices = candidates
            .iter()
            .map(|user| user_button(user, Callback::SelectManagerCandidate(user.id())))
            .collect();
        self.choose(
            actor,
            FlowState::AssignManagerCandidate,
            "Choose the user to promote to manager.".to_owned(),
            choices,
        )
        .await
    }

    pub(super) async fn select_manager_candidate(
        &self,
        actor: UserId,
        candidate: UserId,
    ) -> FlowReplies {
        let organizations = self.registry.list_organizations(actor).await?;
        if organizations.is_empty() {
            return self
                .go_home(actor, "Create an organization first.")
                .await;
        }
        let choices = organizations
            .iter()
            .map(|organization| {
                Button::new(
                    format!(
                        "{} (ID: {})",
                        organization.name().as_str(),
                        organization.id()
                    ),
                    Callback::SelectManagerOrganization(organization.id()).to_string(),
                )
            })
            .collect();
        self.choose(
            actor,
            FlowState::AssignManagerOrganization { candidate },
            "Choose the organization the new manager will run.".to_owned(),
            choices,
        )
        .await
    }

    pub(super) async fn complete_manager_assignment(
        &self,
        actor: UserId,
        candidate: UserId,
        organization: OrganizationId,
    ) -> FlowReplies {
        let request =
            AssignRoleRequest::new(actor, candidate, Role::Manager).with_organization(organization);
        let change = self.registry.assign_role(request).await?;
        self.announce_role_change(actor, &change, true).await
    }

    pub(super) async fn start_manager_revocation(&self, actor: UserId) -> FlowReplies {
        let managers = self.registry.list_managers(actor).await?;
        if managers.is_empty() {
            return self.go_home(actor, "There are no managers.").await;
        }
        let choices = managers
            .iter()
            .map(|user| user_button(user, Callback::SelectManagerRemoval(user.id())))
            .collect();
        self.choose(
            actor,
            FlowState::RevokeManager,
            "Choose the manager to remove.".to_owned(),
            choices,
        )
        .await
    }

    pub(super) async fn complete_revocation(&self, actor: UserId, target: UserId) -> FlowReplies {
        let change = self.registry.revoke_role(actor, target).await?;
        self.announce_role_change(actor, &change, false).await
    }

    /// Tells the target about the change, then confirms it to the actor.
    pub(super) async fn announce_role_change(
        &self,
        actor: UserId,
        change: &RoleChange,
        granted: bool,
    ) -> FlowReplies {
        let role = if granted {
            change.user.role()
        } else {
            change.previous.role()
        };
        let organization = change.organization.as_ref();
        let notice = self.renderer.role_change(
            Audience::Target,
            granted,
            &change.user,
            role.as_str(),
            organization,
        )?;
        let target_menu = home_keyboard(Some(change.user.role()));
        if self
            .dispatcher
            .send(
                change.user.id(),
                &OutboundMessage::new(notice).with_keyboard(target_menu),
            )
            .await
            .is_err()
        {
            info!(user = %change.user.id(), "role change notice not delivered");
        }
        let confirmation = self.renderer.role_change(
            Audience::Actor,
            granted,
            &change.user,
            role.as_str(),
            organization,
        )?;
        self.finish(actor, confirmation).await
    }

    pub(super) async fn show_organizations(&self, actor: UserId) -> FlowReplies {
        let organizations = self.registry.list_organizations(actor).await?;
        Ok(vec![OutboundMessage::new(
            self.renderer.organizations(&organizations)?,
        )])
    }

    pub(super) async fn show_users(&self, actor: UserId) -> FlowReplies {
        let users = self.registry.list_users(actor).await?;
        let organizations = self.registry.list_organizations(actor).await?;
        let listing = self.renderer.users(
            "Users",
            "There are no other users.",
            &users,
            &organizations,
        )?;
        Ok(vec![OutboundMessage::new(listing)])
    }

    pub(super) async fn show_statistics(&self, actor: UserId) -> FlowReplies {
        let statistics = self.registry.statistics(actor).await?;
        Ok(vec![OutboundMessage::new(
            self.renderer.statistics(&statistics)?,
        )])
    }

    pub(super) async fn start_broadcast(&self, actor: UserId) -> FlowReplies {
        self.require(actor, Operation::Broadcast).await?;
        self.prompt(actor, FlowState::Broadcast, ASK_BROADCAST).await
    }

    pub(super) async fn complete_broadcast(&self, actor: UserId, text: &str) -> FlowReplies {
        if text.trim().is_empty() {
            return Ok(vec![OutboundMessage::new(ASK_BROADCAST)]);
        }
        let recipients = self.registry.broadcast_recipients(actor).await?;
        let message = OutboundMessage::new(self.renderer.broadcast(text.trim())?);
        let report = self.dispatcher.broadcast(&recipients, &message).await;
        info!(
            target: AUDIT_TARGET,
            actor = %actor,
            sent = report.sent,
            failed = report.failed,
            "broadcast sent"
        );
        self.finish(actor, broadcast_summary(report)).await
    }

    pub(super) async fn start_reset(&self, actor: UserId) -> FlowReplies {
        self.require(actor, Operation::ResetAll).await?;
        self.flows.save(actor, FlowState::ConfirmReset).await?;
        let buttons = vec![
            Button::new("Yes, delete everything", Callback::ConfirmReset.to_string()),
            Button::new("Cancel", Callback::CancelReset.to_string()),
        ];
        Ok(vec![
            OutboundMessage::new(
                "This deletes every task, organization and user except the administrator. Continue?",
            )
            .with_keyboard(Keyboard::Inline(vec![buttons])),
        ])
    }

    pub(super) async fn complete_reset(&self, actor: UserId) -> FlowReplies {
        let removed = self.registry.reset_all(actor).await?;
        let notice = OutboundMessage::new("All data was reset. Register again to continue.")
            .with_keyboard(home_keyboard(None));
        self.dispatcher.broadcast(&removed, &notice).await;
        self.finish(
            actor,
            format!("All data deleted. Users removed: {}.", removed.len()),
        )
        .await
    }
}
