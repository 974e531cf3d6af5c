//! Domain model for users, roles and organizations.
//!
//! Role and organization membership are modelled together as a
//! [`Membership`] so that an employee or manager without an organization, or
//! an admin with one, cannot be constructed.

mod access;
mod error;
mod ids;
mod organization;
mod role;
mod statistics;
mod user;

pub use access::{AccessDenied, Operation, authorize};
pub use error::{DirectoryDomainError, ParseRoleError};
pub use ids::{OrganizationId, UserId};
pub use organization::{Organization, OrganizationName};
pub use role::Role;
pub use statistics::{NamedCount, Statistics, StatusCount};
pub use user::{FullName, Membership, User};
