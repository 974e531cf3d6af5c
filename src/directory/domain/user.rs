//! Registered users and their organization membership.

use super::{DirectoryDomainError, OrganizationId, Role, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

const MAX_NAME_LENGTH: usize = 255;

/// Validated display name typed by the user at registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FullName(String);

impl FullName {
    /// Creates a validated full name.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::EmptyFullName`] when the name is blank
    /// or [`DirectoryDomainError::FullNameTooLong`] when it exceeds 255
    /// characters.
    pub fn new(value: impl Into<String>) -> Result<Self, DirectoryDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DirectoryDomainError::EmptyFullName);
        }
        if trimmed.chars().count() > MAX_NAME_LENGTH {
            return Err(DirectoryDomainError::FullNameTooLong);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FullName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for FullName {
    type Error = DirectoryDomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FullName> for String {
    fn from(value: FullName) -> Self {
        value.0
    }
}

/// Role together with the organization it is scoped to.
///
/// Employees and managers always belong to an organization; plain users and
/// admins never do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Membership {
    /// Registered, waiting for a role.
    Unassigned,
    /// Bot operator.
    Admin,
    /// Employee of the given organization.
    Employee(OrganizationId),
    /// Manager of the given organization.
    Manager(OrganizationId),
}

impl Membership {
    /// Rebuilds a membership from its persisted role and organization
    /// columns.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::InconsistentMembership`] when the
    /// organization presence does not match the role.
    pub const fn from_parts(
        role: Role,
        organization: Option<OrganizationId>,
    ) -> Result<Self, DirectoryDomainError> {
        match (role, organization) {
            (Role::User, None) => Ok(Self::Unassigned),
            (Role::Admin, None) => Ok(Self::Admin),
            (Role::Employee, Some(org)) => Ok(Self::Employee(org)),
            (Role::Manager, Some(org)) => Ok(Self::Manager(org)),
            (_, found) => Err(DirectoryDomainError::InconsistentMembership {
                role,
                has_organization: found.is_some(),
            }),
        }
    }

    /// Returns the role derived from this membership.
    #[must_use]
    pub const fn role(self) -> Role {
        match self {
            Self::Unassigned => Role::User,
            Self::Admin => Role::Admin,
            Self::Employee(_) => Role::Employee,
            Self::Manager(_) => Role::Manager,
        }
    }

    /// Returns the organization, if the role is scoped to one.
    #[must_use]
    pub const fn organization(self) -> Option<OrganizationId> {
        match self {
            Self::Employee(org) | Self::Manager(org) => Some(org),
            Self::Unassigned | Self::Admin => None,
        }
    }

    /// Returns whether this membership is an employee of `organization`.
    #[must_use]
    pub fn is_employee_of(self, organization: OrganizationId) -> bool {
        self == Self::Employee(organization)
    }

    /// Returns whether this membership is a manager of `organization`.
    #[must_use]
    pub fn is_manager_of(self, organization: OrganizationId) -> bool {
        self == Self::Manager(organization)
    }
}

/// Registered user of the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    full_name: FullName,
    membership: Membership,
}

impl User {
    /// Builds a user from its parts.
    #[must_use]
    pub const fn new(id: UserId, full_name: FullName, membership: Membership) -> Self {
        Self {
            id,
            full_name,
            membership,
        }
    }

    /// Returns the platform user identifier.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns the display name.
    #[must_use]
    pub const fn full_name(&self) -> &FullName {
        &self.full_name
    }

    /// Returns the current membership.
    #[must_use]
    pub const fn membership(&self) -> Membership {
        self.membership
    }

    /// Returns the role derived from the membership.
    #[must_use]
    pub const fn role(&self) -> Role {
        self.membership.role()
    }

    /// Returns the organization, if any.
    #[must_use]
    pub const fn organization(&self) -> Option<OrganizationId> {
        self.membership.organization()
    }

    /// Computes the membership this user would hold after receiving `role`
    /// in `organization`.
    ///
    /// Only plain users can be granted a role, and only the employee and
    /// manager roles can be granted.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::NotEligible`] when the user already
    /// holds a role or the requested role cannot be granted.
    pub const fn grant(
        &self,
        role: Role,
        organization: OrganizationId,
    ) -> Result<Membership, DirectoryDomainError> {
        match (self.membership, role) {
            (Membership::Unassigned, Role::Employee) => Ok(Membership::Employee(organization)),
            (Membership::Unassigned, Role::Manager) => Ok(Membership::Manager(organization)),
            _ => Err(DirectoryDomainError::NotEligible {
                user: self.id,
                current: self.membership.role(),
                requested: role,
            }),
        }
    }

    /// Computes the membership after revoking `expected`.
    ///
    /// # Errors
    ///
    /// Returns [`DirectoryDomainError::RoleMismatch`] when the user does not
    /// currently hold `expected`, or when `expected` is not revocable.
    pub fn revoke(&self, expected: Role) -> Result<Membership, DirectoryDomainError> {
        let current = self.membership.role();
        if current != expected || !expected.requires_organization() {
            return Err(DirectoryDomainError::RoleMismatch {
                user: self.id,
                current,
                expected,
            });
        }
        Ok(Membership::Unassigned)
    }
}
