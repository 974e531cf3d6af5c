//! Port contracts for the directory module.

mod repository;

pub use repository::{
    DirectoryRepository, DirectoryRepositoryError, DirectoryRepositoryResult, OrganizationRemoval,
};
