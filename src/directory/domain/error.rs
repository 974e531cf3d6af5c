//! Error types for directory domain validation and parsing.

use super::{Role, UserId};
use thiserror::Error;

/// Errors returned while constructing or mutating directory domain values.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DirectoryDomainError {
    /// The full name is empty after trimming.
    #[error("full name must not be empty")]
    EmptyFullName,

    /// The full name exceeds the 255-character storage limit.
    #[error("full name exceeds 255 character limit")]
    FullNameTooLong,

    /// The organization name is empty after trimming.
    #[error("organization name must not be empty")]
    EmptyOrganizationName,

    /// The organization name exceeds the 255-character storage limit.
    #[error("organization name exceeds 255 character limit: {0}")]
    OrganizationNameTooLong(String),

    /// The user cannot receive the requested role from their current one.
    #[error("user {user} holds role {current} and cannot become {requested}")]
    NotEligible {
        /// User whose membership was to change.
        user: UserId,
        /// Role the user currently holds.
        current: Role,
        /// Role that was requested.
        requested: Role,
    },

    /// The user does not hold the role that was to be revoked.
    #[error("user {user} holds role {current}, expected {expected}")]
    RoleMismatch {
        /// User whose role was to be revoked.
        user: UserId,
        /// Role the user currently holds.
        current: Role,
        /// Role the caller expected to revoke.
        expected: Role,
    },

    /// A persisted role and organization pair violates the membership
    /// invariant.
    #[error("role {role} is inconsistent with organization presence ({has_organization})")]
    InconsistentMembership {
        /// Persisted role.
        role: Role,
        /// Whether an organization reference was persisted.
        has_organization: bool,
    },
}

/// Error returned while parsing roles from persistence.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown role: {0}")]
pub struct ParseRoleError(pub String);
