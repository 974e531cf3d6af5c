//! Errors raised while advancing a flow.

use crate::conversation::ports::FlowStoreError;
use crate::directory::{domain::AccessDenied, services::RegistryError};
use crate::task::services::TaskLifecycleError;
use thiserror::Error;

/// Failure that aborts the current flow step.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The actor's freshly loaded role does not allow the step.
    #[error(transparent)]
    Forbidden(#[from] AccessDenied),
    /// Registry operation failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),
    /// Task lifecycle operation failed.
    #[error(transparent)]
    Tasks(#[from] TaskLifecycleError),
    /// Flow state could not be read or written.
    #[error(transparent)]
    State(#[from] FlowStoreError),
    /// A message template failed to render.
    #[error("template rendering failed: {0}")]
    Render(String),
}

impl FlowError {
    /// Returns whether the failure came from infrastructure rather than from
    /// the request.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        match self {
            Self::Registry(err) => err.is_store_failure(),
            Self::Tasks(err) => err.is_store_failure(),
            Self::State(_) | Self::Render(_) => true,
            Self::Forbidden(_) => false,
        }
    }

    /// Plain-language explanation shown to the actor.
    #[must_use]
    pub const fn user_message(&self) -> &'static str {
        match self {
            Self::Forbidden(AccessDenied::Unregistered(_))
            | Self::Registry(RegistryError::Forbidden(AccessDenied::Unregistered(_)))
            | Self::Tasks(TaskLifecycleError::Forbidden(AccessDenied::Unregistered(_))) => {
                "Please register first: send /start."
            }
            Self::Forbidden(AccessDenied::Role { .. })
            | Self::Registry(RegistryError::Forbidden(_))
            | Self::Tasks(TaskLifecycleError::Forbidden(_)) => {
                "You do not have permission to do that."
            }
            Self::Registry(err) => registry_message(err),
            Self::Tasks(err) => task_message(err),
            Self::State(_) | Self::Render(_) => "Something went wrong. Please try again later.",
        }
    }
}

const fn registry_message(err: &RegistryError) -> &'static str {
    match err {
        RegistryError::Forbidden(_) => "You do not have permission to do that.",
        RegistryError::OutsideOrganization(_) => {
            "You can only manage members of your own organization."
        }
        RegistryError::UserNotFound(_) => "That user is not registered.",
        RegistryError::OrganizationNotFound(_) => "That organization does not exist.",
        RegistryError::DuplicateName(_) => "An organization with that name already exists.",
        RegistryError::AlreadyRegistered(_) => "You are already registered.",
        RegistryError::NotEligible { .. } => "That user is not eligible for this change.",
        RegistryError::MembershipChanged(_) => {
            "That user's role changed in the meantime. Please try again."
        }
        RegistryError::OrganizationRequired(_) => "An organization is required for that role.",
        RegistryError::Domain(_) => "That input is not valid.",
        RegistryError::Repository(_) => "Something went wrong. Please try again later.",
    }
}

const fn task_message(err: &TaskLifecycleError) -> &'static str {
    match err {
        TaskLifecycleError::Forbidden(_) => "You do not have permission to do that.",
        TaskLifecycleError::NotAssignee { .. } => "That task is not assigned to you.",
        TaskLifecycleError::NotFound(_) => "That task no longer exists.",
        TaskLifecycleError::UserNotFound(_) => "That user is not registered.",
        TaskLifecycleError::OrganizationMismatch { .. } => {
            "That user is not an employee of your organization."
        }
        TaskLifecycleError::InvalidTransition { .. } => "That status change is not allowed.",
        TaskLifecycleError::Frozen(_) => {
            "The task is frozen because its manager or employee lost their role."
        }
        TaskLifecycleError::MembershipChanged(_) => {
            "A role changed in the meantime. Please try again."
        }
        TaskLifecycleError::Domain(_) => "That input is not valid.",
        TaskLifecycleError::Directory(_) | TaskLifecycleError::Repository(_) => {
            "Something went wrong. Please try again later."
        }
    }
}
