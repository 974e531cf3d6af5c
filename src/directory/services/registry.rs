//! Service layer for registration, role assignment and organization
//! management.
//!
//! Every privileged call reloads the acting user from the repository and
//! evaluates a single [`Operation`] against that fresh record.

use crate::directory::{
    domain::{
        AccessDenied, DirectoryDomainError, FullName, Membership, Operation, Organization,
        OrganizationId, OrganizationName, Role, Statistics, User, UserId, authorize,
    },
    ports::{DirectoryRepository, DirectoryRepositoryError, OrganizationRemoval},
};
use crate::telemetry::AUDIT_TARGET;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Request payload for granting a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssignRoleRequest {
    actor: UserId,
    target: UserId,
    role: Role,
    organization: Option<OrganizationId>,
}

impl AssignRoleRequest {
    /// Creates a request granting `role` to `target` on behalf of `actor`.
    #[must_use]
    pub const fn new(actor: UserId, target: UserId, role: Role) -> Self {
        Self {
            actor,
            target,
            role,
            organization: None,
        }
    }

    /// Sets the organization the role is scoped to.
    ///
    /// Required for managers. Employees default to the acting manager's
    /// organization.
    #[must_use]
    pub const fn with_organization(mut self, organization: OrganizationId) -> Self {
        self.organization = Some(organization);
        self
    }
}

/// Membership change applied by [`RegistryService::assign_role`] or
/// [`RegistryService::revoke_role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleChange {
    /// The user after the change.
    pub user: User,
    /// Membership held before the change.
    pub previous: Membership,
    /// Organization the granted or revoked role was scoped to, if it still
    /// exists.
    pub organization: Option<Organization>,
}

/// Service-level errors for registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The actor may not perform the operation.
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    /// The actor tried to act outside their own organization.
    #[error("action is limited to organization {0}")]
    OutsideOrganization(OrganizationId),
    /// The referenced user is not registered.
    #[error("user not found: {0}")]
    UserNotFound(UserId),
    /// The referenced organization does not exist.
    #[error("organization not found: {0}")]
    OrganizationNotFound(OrganizationId),
    /// The organization name is taken.
    #[error("organization name already taken: {0}")]
    DuplicateName(OrganizationName),
    /// The user is already registered.
    #[error("user {0} is already registered")]
    AlreadyRegistered(UserId),
    /// The target's current role does not allow the change.
    #[error("user {user} holding role {current} is not eligible")]
    NotEligible {
        /// Target user.
        user: UserId,
        /// Role the target holds.
        current: Role,
    },
    /// The target's membership changed between the check and the write.
    #[error("membership of user {0} changed concurrently")]
    MembershipChanged(UserId),
    /// A manager assignment did not name an organization.
    #[error("role {0} requires an organization")]
    OrganizationRequired(Role),
    /// Domain validation failed.
    #[error(transparent)]
    Domain(DirectoryDomainError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(DirectoryRepositoryError),
}

impl RegistryError {
    /// Returns whether the failure came from the store rather than from the
    /// request.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(self, Self::Repository(_))
    }
}

impl From<DirectoryDomainError> for RegistryError {
    fn from(err: DirectoryDomainError) -> Self {
        match err {
            DirectoryDomainError::NotEligible { user, current, .. }
            | DirectoryDomainError::RoleMismatch { user, current, .. } => {
                Self::NotEligible { user, current }
            }
            other => Self::Domain(other),
        }
    }
}

impl From<DirectoryRepositoryError> for RegistryError {
    fn from(err: DirectoryRepositoryError) -> Self {
        match err {
            DirectoryRepositoryError::DuplicateUser(id) => Self::AlreadyRegistered(id),
            DirectoryRepositoryError::UserNotFound(id) => Self::UserNotFound(id),
            DirectoryRepositoryError::OrganizationNotFound(id) => Self::OrganizationNotFound(id),
            DirectoryRepositoryError::DuplicateOrganizationName(name) => Self::DuplicateName(name),
            DirectoryRepositoryError::MembershipChanged(id) => Self::MembershipChanged(id),
            other @ DirectoryRepositoryError::Persistence(_) => Self::Repository(other),
        }
    }
}

/// Result type for registry service operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Registration, role and organization orchestration service.
#[derive(Clone)]
pub struct RegistryService<R>
where
    R: DirectoryRepository,
{
    repository: Arc<R>,
    admin: UserId,
}

impl<R> RegistryService<R>
where
    R: DirectoryRepository,
{
    /// Creates a registry service; `admin` registers with the admin role.
    #[must_use]
    pub const fn new(repository: Arc<R>, admin: UserId) -> Self {
        Self { repository, admin }
    }

    /// Returns the configured admin identity.
    #[must_use]
    pub const fn admin(&self) -> UserId {
        self.admin
    }

    /// Registers a user under the typed full name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] when the user exists or
    /// [`RegistryError::Domain`] when the name is blank or too long.
    pub async fn register(&self, id: UserId, full_name: &str) -> RegistryResult<User> {
        let name = FullName::new(full_name)?;
        if self.repository.find_user(id).await?.is_some() {
            return Err(RegistryError::AlreadyRegistered(id));
        }
        let membership = if id == self.admin {
            Membership::Admin
        } else {
            Membership::Unassigned
        };
        let user = User::new(id, name, membership);
        self.repository.insert_user(&user).await?;
        info!(
            target: AUDIT_TARGET,
            user = %id,
            role = %user.role(),
            "user registered"
        );
        Ok(user)
    }

    /// Loads a user without an authorization check.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Repository`] when the lookup fails.
    pub async fn find_user(&self, id: UserId) -> RegistryResult<Option<User>> {
        Ok(self.repository.find_user(id).await?)
    }

    /// Loads an organization without an authorization check.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Repository`] when the lookup fails.
    pub async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> RegistryResult<Option<Organization>> {
        Ok(self.repository.find_organization(id).await?)
    }

    /// Grants the employee or manager role to a plain user.
    ///
    /// Admins assign managers into any existing organization. Managers
    /// assign employees into their own organization.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] when the actor lacks the
    /// permission, [`RegistryError::NotEligible`] when the target is not a
    /// plain user, [`RegistryError::OrganizationNotFound`] when the
    /// organization is absent, or [`RegistryError::MembershipChanged`] when
    /// the target changed concurrently.
    pub async fn assign_role(&self, request: AssignRoleRequest) -> RegistryResult<RoleChange> {
        let AssignRoleRequest {
            actor,
            target,
            role,
            organization: requested,
        } = request;
        let organization = match role {
            Role::Manager => {
                self.authorized(actor, Operation::AssignManager).await?;
                requested.ok_or(RegistryError::OrganizationRequired(role))?
            }
            Role::Employee => {
                let manager = self.authorized(actor, Operation::AssignEmployee).await?;
                let own = manager
                    .organization()
                    .ok_or(RegistryError::OrganizationRequired(role))?;
                if requested.is_some_and(|org| org != own) {
                    return Err(RegistryError::OutsideOrganization(own));
                }
                own
            }
            Role::User | Role::Admin => {
                let user = self.user_or_error(target).await?;
                return Err(RegistryError::NotEligible {
                    user: target,
                    current: user.role(),
                });
            }
        };

        let found = self
            .repository
            .find_organization(organization)
            .await?
            .ok_or(RegistryError::OrganizationNotFound(organization))?;
        let user = self.user_or_error(target).await?;
        let next = user.grant(role, organization)?;
        let previous = user.membership();
        let updated = self
            .repository
            .replace_membership(target, previous, next)
            .await?;
        info!(
            target: AUDIT_TARGET,
            actor = %actor,
            user = %target,
            role = %role,
            organization = %organization,
            "role granted"
        );
        Ok(RoleChange {
            user: updated,
            previous,
            organization: Some(found),
        })
    }

    /// Reverts a manager (when the actor is the admin) or an employee of the
    /// actor's organization (when the actor is a manager) to a plain user.
    ///
    /// Tasks referencing the target are left untouched.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] when the actor lacks the
    /// permission, [`RegistryError::NotEligible`] when the target does not
    /// hold the revocable role, or [`RegistryError::MembershipChanged`] when
    /// the target changed concurrently.
    pub async fn revoke_role(&self, actor: UserId, target: UserId) -> RegistryResult<RoleChange> {
        let loaded = self.repository.find_user(actor).await?;
        let (operation, expected) = match loaded.as_ref().map(User::role) {
            Some(Role::Admin) => (Operation::RevokeManager, Role::Manager),
            _ => (Operation::RevokeEmployee, Role::Employee),
        };
        let acting = authorize(loaded.as_ref(), operation)?;

        let user = self.user_or_error(target).await?;
        let next = user.revoke(expected)?;
        let previous = user.membership();
        if expected == Role::Employee && previous.organization() != acting.organization() {
            return Err(RegistryError::NotEligible {
                user: target,
                current: user.role(),
            });
        }

        let updated = self
            .repository
            .replace_membership(target, previous, next)
            .await?;
        let organization = match previous.organization() {
            Some(id) => self.repository.find_organization(id).await?,
            None => None,
        };
        info!(
            target: AUDIT_TARGET,
            actor = %actor,
            user = %target,
            role = %expected,
            "role revoked"
        );
        Ok(RoleChange {
            user: updated,
            previous,
            organization,
        })
    }

    /// Creates an organization.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins,
    /// [`RegistryError::Domain`] for an invalid name, or
    /// [`RegistryError::DuplicateName`] when the name is taken.
    pub async fn create_organization(
        &self,
        actor: UserId,
        name: &str,
    ) -> RegistryResult<Organization> {
        self.authorized(actor, Operation::CreateOrganization).await?;
        let validated = OrganizationName::new(name)?;
        let organization = self.repository.insert_organization(&validated).await?;
        info!(
            target: AUDIT_TARGET,
            actor = %actor,
            organization = %organization.id(),
            name = %organization.name(),
            "organization created"
        );
        Ok(organization)
    }

    /// Deletes an organization, demoting its members and deleting its tasks
    /// in one transaction.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins or
    /// [`RegistryError::OrganizationNotFound`] when the organization is
    /// absent.
    pub async fn delete_organization(
        &self,
        actor: UserId,
        id: OrganizationId,
    ) -> RegistryResult<OrganizationRemoval> {
        self.authorized(actor, Operation::DeleteOrganization).await?;
        let removal = self.repository.delete_organization(id).await?;
        info!(
            target: AUDIT_TARGET,
            actor = %actor,
            organization = %id,
            demoted = removal.demoted.len(),
            removed_tasks = removal.removed_tasks,
            "organization deleted"
        );
        Ok(removal)
    }

    /// Deletes every task, organization and non-admin user.
    ///
    /// Returns the removed user ids so they can be told to register again.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins.
    pub async fn reset_all(&self, actor: UserId) -> RegistryResult<Vec<UserId>> {
        self.authorized(actor, Operation::ResetAll).await?;
        let removed = self.repository.reset().await?;
        info!(
            target: AUDIT_TARGET,
            actor = %actor,
            removed_users = removed.len(),
            "all data reset"
        );
        Ok(removed)
    }

    /// Lists every organization.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins.
    pub async fn list_organizations(&self, actor: UserId) -> RegistryResult<Vec<Organization>> {
        self.authorized(actor, Operation::ListOrganizations).await?;
        Ok(self.repository.list_organizations().await?)
    }

    /// Lists every registered user except the actor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins.
    pub async fn list_users(&self, actor: UserId) -> RegistryResult<Vec<User>> {
        self.authorized(actor, Operation::ListUsers).await?;
        let mut users = self.repository.list_users().await?;
        users.retain(|user| user.id() != actor);
        Ok(users)
    }

    /// Lists plain users who can receive a role from the actor.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] unless the actor may assign
    /// managers or employees.
    pub async fn list_candidates(&self, actor: UserId) -> RegistryResult<Vec<User>> {
        let acting = self.repository.find_user(actor).await?;
        let operation = match acting.as_ref().map(User::role) {
            Some(Role::Admin) => Operation::AssignManager,
            _ => Operation::AssignEmployee,
        };
        authorize(acting.as_ref(), operation)?;
        Ok(self.repository.list_users_with_role(Role::User).await?)
    }

    /// Lists every manager.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins.
    pub async fn list_managers(&self, actor: UserId) -> RegistryResult<Vec<User>> {
        self.authorized(actor, Operation::ListManagers).await?;
        Ok(self.repository.list_users_with_role(Role::Manager).await?)
    }

    /// Lists employees of the acting manager's organization.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-managers.
    pub async fn list_employees(&self, actor: UserId) -> RegistryResult<Vec<User>> {
        let manager = self.authorized(actor, Operation::ListEmployees).await?;
        let organization = manager
            .organization()
            .ok_or(RegistryError::OrganizationRequired(Role::Manager))?;
        Ok(self
            .repository
            .list_members(organization, Role::Employee)
            .await?)
    }

    /// Lists every user except the sender as broadcast recipients.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins.
    pub async fn broadcast_recipients(&self, actor: UserId) -> RegistryResult<Vec<UserId>> {
        self.authorized(actor, Operation::Broadcast).await?;
        let users = self.repository.list_users().await?;
        Ok(users
            .iter()
            .map(User::id)
            .filter(|id| *id != actor)
            .collect())
    }

    /// Computes aggregate counts.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Forbidden`] for non-admins.
    pub async fn statistics(&self, actor: UserId) -> RegistryResult<Statistics> {
        self.authorized(actor, Operation::ViewStatistics).await?;
        Ok(self.repository.statistics().await?)
    }

    async fn authorized(&self, actor: UserId, operation: Operation) -> RegistryResult<User> {
        let acting = self.repository.find_user(actor).await?;
        authorize(acting.as_ref(), operation)?;
        acting.ok_or(RegistryError::UserNotFound(actor))
    }

    async fn user_or_error(&self, id: UserId) -> RegistryResult<User> {
        self.repository
            .find_user(id)
            .await?
            .ok_or(RegistryError::UserNotFound(id))
    }
}
