//! Shared fixtures for in-memory integration tests.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskbot::directory::{
    domain::{OrganizationId, Role, UserId},
    services::{AssignRoleRequest, RegistryService},
};
use taskbot::storage::memory::InMemoryStore;
use taskbot::task::{
    domain::{OrphanPolicy, TaskId},
    services::{CreateTaskRequest, TaskLifecycleService},
};

/// Configured administrator.
pub const ADMIN: UserId = UserId::new(1000);
/// Manager of "Acme".
pub const MANAGER: UserId = UserId::new(2000);
/// Employee of "Acme".
pub const EMPLOYEE: UserId = UserId::new(3000);
/// Registered user without a role.
pub const NEWCOMER: UserId = UserId::new(4000);

/// Task service over the in-memory store.
pub type TestTasks = TaskLifecycleService<InMemoryStore, InMemoryStore, DefaultClock>;

/// Registry and task services sharing one store.
pub struct Office {
    pub store: Arc<InMemoryStore>,
    pub registry: RegistryService<InMemoryStore>,
    pub tasks: TestTasks,
}

impl Office {
    /// Services over a fresh store with the given orphan policy.
    #[must_use]
    pub fn new(policy: OrphanPolicy) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self {
            registry: RegistryService::new(Arc::clone(&store), ADMIN),
            tasks: TaskLifecycleService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::new(DefaultClock),
                policy,
            ),
            store,
        }
    }

    /// Registers the cast, creates "Acme" and staffs it.
    ///
    /// # Errors
    ///
    /// Returns an error if any setup call is refused.
    pub async fn staff(&self) -> eyre::Result<OrganizationId> {
        self.registry.register(ADMIN, "Ada Admin").await?;
        self.registry.register(MANAGER, "Mona Manager").await?;
        self.registry.register(EMPLOYEE, "Eve Employee").await?;
        self.registry.register(NEWCOMER, "Nils Newcomer").await?;
        let organization = self.registry.create_organization(ADMIN, "Acme").await?.id();
        self.registry
            .assign_role(
                AssignRoleRequest::new(ADMIN, MANAGER, Role::Manager)
                    .with_organization(organization),
            )
            .await?;
        self.registry
            .assign_role(AssignRoleRequest::new(MANAGER, EMPLOYEE, Role::Employee))
            .await?;
        Ok(organization)
    }

    /// Hands a task from the manager to the employee.
    ///
    /// # Errors
    ///
    /// Returns an error if task creation is refused.
    pub async fn hand_out(&self, title: &str) -> eyre::Result<TaskId> {
        let task = self
            .tasks
            .create_task(CreateTaskRequest::new(
                MANAGER,
                EMPLOYEE,
                title,
                "See the shared folder",
            ))
            .await?;
        Ok(task.id())
    }
}

/// Provides services that keep tasks of demoted users actionable.
#[fixture]
pub fn office() -> Office {
    Office::new(OrphanPolicy::Retain)
}
