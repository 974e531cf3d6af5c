//! Application services for the directory module.

mod registry;

pub use registry::{AssignRoleRequest, RegistryError, RegistryResult, RegistryService, RoleChange};
