//! Repository port for users, memberships and organizations.

use crate::directory::domain::{
    Membership, Organization, OrganizationId, OrganizationName, Role, Statistics, User, UserId,
};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for directory repository operations.
pub type DirectoryRepositoryResult<T> = Result<T, DirectoryRepositoryError>;

/// Outcome of an organization deletion cascade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrganizationRemoval {
    /// The organization as it was before deletion.
    pub organization: Organization,
    /// Members reverted to plain users, ordered by id.
    pub demoted: Vec<UserId>,
    /// Number of tasks deleted with the organization.
    pub removed_tasks: u64,
}

/// Directory persistence contract.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// Stores a newly registered user.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryRepositoryError::DuplicateUser`] when the user id is
    /// already registered.
    async fn insert_user(&self, user: &User) -> DirectoryRepositoryResult<()>;

    /// Finds a user by platform id.
    async fn find_user(&self, id: UserId) -> DirectoryRepositoryResult<Option<User>>;

    /// Returns every registered user ordered by id.
    async fn list_users(&self) -> DirectoryRepositoryResult<Vec<User>>;

    /// Returns users holding `role` ordered by id.
    async fn list_users_with_role(&self, role: Role) -> DirectoryRepositoryResult<Vec<User>>;

    /// Returns members of `organization` holding `role`, ordered by id.
    async fn list_members(
        &self,
        organization: OrganizationId,
        role: Role,
    ) -> DirectoryRepositoryResult<Vec<User>>;

    /// Replaces the membership of `id` if it still equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryRepositoryError::UserNotFound`] when the user is
    /// absent, [`DirectoryRepositoryError::MembershipChanged`] when the stored
    /// membership no longer equals `expected`, or
    /// [`DirectoryRepositoryError::OrganizationNotFound`] when `next`
    /// references a missing organization.
    async fn replace_membership(
        &self,
        id: UserId,
        expected: Membership,
        next: Membership,
    ) -> DirectoryRepositoryResult<User>;

    /// Creates an organization with a store-assigned id.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryRepositoryError::DuplicateOrganizationName`] when
    /// the name is taken.
    async fn insert_organization(
        &self,
        name: &OrganizationName,
    ) -> DirectoryRepositoryResult<Organization>;

    /// Finds an organization by id.
    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> DirectoryRepositoryResult<Option<Organization>>;

    /// Returns every organization ordered by id.
    async fn list_organizations(&self) -> DirectoryRepositoryResult<Vec<Organization>>;

    /// Atomically demotes every member, deletes the organization's tasks and
    /// deletes the organization.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryRepositoryError::OrganizationNotFound`] when the
    /// organization is absent.
    async fn delete_organization(
        &self,
        id: OrganizationId,
    ) -> DirectoryRepositoryResult<OrganizationRemoval>;

    /// Atomically deletes every task, every non-admin user and every
    /// organization, returning the removed user ids ordered by id.
    async fn reset(&self) -> DirectoryRepositoryResult<Vec<UserId>>;

    /// Computes aggregate counts.
    async fn statistics(&self) -> DirectoryRepositoryResult<Statistics>;
}

/// Errors returned by directory repository implementations.
#[derive(Debug, Clone, Error)]
pub enum DirectoryRepositoryError {
    /// The user id is already registered.
    #[error("duplicate user: {0}")]
    DuplicateUser(UserId),

    /// The user was not found.
    #[error("user not found: {0}")]
    UserNotFound(UserId),

    /// The organization was not found.
    #[error("organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    /// An organization with the same name exists.
    #[error("duplicate organization name: {0}")]
    DuplicateOrganizationName(OrganizationName),

    /// The stored membership differs from the one the caller based its
    /// decision on.
    #[error("membership of user {0} changed concurrently")]
    MembershipChanged(UserId),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl DirectoryRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
