//! Registry service tests against the in-memory store.

use std::sync::Arc;

use crate::directory::{
    domain::{AccessDenied, Membership, Operation, OrganizationId, Role, User, UserId},
    services::{AssignRoleRequest, RegistryError, RegistryService},
};
use crate::storage::memory::InMemoryStore;
use crate::task::{
    domain::{OrphanPolicy, TaskStatus},
    services::{CreateTaskRequest, TaskLifecycleService},
};
use eyre::{Result, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

const ADMIN: UserId = UserId::new(100);

#[fixture]
fn store() -> Arc<InMemoryStore> {
    Arc::new(InMemoryStore::new())
}

fn registry(store: &Arc<InMemoryStore>) -> RegistryService<InMemoryStore> {
    RegistryService::new(Arc::clone(store), ADMIN)
}

async fn with_manager(
    service: &RegistryService<InMemoryStore>,
    manager: UserId,
    organization_name: &str,
) -> Result<OrganizationId> {
    if service.find_user(ADMIN).await?.is_none() {
        service.register(ADMIN, "Ada Admin").await?;
    }
    service.register(manager, "Mona Manager").await?;
    let organization = service
        .create_organization(ADMIN, organization_name)
        .await?
        .id();
    service
        .assign_role(
            AssignRoleRequest::new(ADMIN, manager, Role::Manager).with_organization(organization),
        )
        .await?;
    Ok(organization)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn configured_admin_registers_as_admin(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);

    let admin = service.register(ADMIN, "  Ada Admin ").await?;
    let user = service.register(UserId::new(1), "Pat Plain").await?;

    assert_eq!(admin.role(), Role::Admin);
    assert_eq!(admin.full_name().as_str(), "Ada Admin");
    assert_eq!(user.membership(), Membership::Unassigned);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn registering_twice_is_refused(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    service.register(UserId::new(1), "Pat Plain").await?;

    let result = service.register(UserId::new(1), "Pat Again").await;

    ensure!(
        matches!(result, Err(RegistryError::AlreadyRegistered(id)) if id == UserId::new(1)),
        "expected duplicate registration, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn organization_names_are_unique(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    service.register(ADMIN, "Ada Admin").await?;
    service.create_organization(ADMIN, "Acme").await?;

    let result = service.create_organization(ADMIN, " Acme ").await;

    ensure!(
        matches!(result, Err(RegistryError::DuplicateName(ref name)) if name.as_str() == "Acme"),
        "expected duplicate name, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_the_admin_creates_organizations(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    service.register(UserId::new(1), "Pat Plain").await?;

    let registered = service.create_organization(UserId::new(1), "Acme").await;
    let unregistered = service.create_organization(UserId::new(2), "Acme").await;

    ensure!(
        matches!(
            registered,
            Err(RegistryError::Forbidden(AccessDenied::Role {
                role: Role::User,
                operation: Operation::CreateOrganization,
            }))
        ),
        "expected a role denial, got {registered:?}"
    );
    ensure!(
        matches!(
            unregistered,
            Err(RegistryError::Forbidden(AccessDenied::Unregistered(_)))
        ),
        "expected an unregistered denial, got {unregistered:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn manager_assignment_requires_an_existing_organization(
    store: Arc<InMemoryStore>,
) -> Result<()> {
    let service = registry(&store);
    service.register(ADMIN, "Ada Admin").await?;
    service.register(UserId::new(1), "Pat Plain").await?;

    let missing = OrganizationId::new(77);
    let result = service
        .assign_role(
            AssignRoleRequest::new(ADMIN, UserId::new(1), Role::Manager).with_organization(missing),
        )
        .await;

    ensure!(
        matches!(result, Err(RegistryError::OrganizationNotFound(id)) if id == missing),
        "expected missing organization, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn role_change_reports_previous_membership(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    let manager = UserId::new(1);
    let organization = with_manager(&service, manager, "Acme").await?;

    let change = service.revoke_role(ADMIN, manager).await?;

    assert_eq!(change.previous, Membership::Manager(organization));
    assert_eq!(change.user.membership(), Membership::Unassigned);
    assert_eq!(
        change.organization.map(|org| org.name().as_str().to_owned()),
        Some("Acme".to_owned())
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn managers_enrol_employees_into_their_own_organization(
    store: Arc<InMemoryStore>,
) -> Result<()> {
    let service = registry(&store);
    let manager = UserId::new(1);
    let organization = with_manager(&service, manager, "Acme").await?;
    service.register(UserId::new(2), "Eve Employee").await?;

    let change = service
        .assign_role(AssignRoleRequest::new(manager, UserId::new(2), Role::Employee))
        .await?;
    let employees = service.list_employees(manager).await?;

    assert_eq!(change.user.membership(), Membership::Employee(organization));
    assert_eq!(
        employees.iter().map(User::id).collect::<Vec<_>>(),
        vec![UserId::new(2)]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn managers_cannot_enrol_into_another_organization(
    store: Arc<InMemoryStore>,
) -> Result<()> {
    let service = registry(&store);
    let manager = UserId::new(1);
    let own = with_manager(&service, manager, "Acme").await?;
    let other = with_manager(&service, UserId::new(3), "Globex").await?;
    service.register(UserId::new(2), "Eve Employee").await?;

    let result = service
        .assign_role(
            AssignRoleRequest::new(manager, UserId::new(2), Role::Employee).with_organization(other),
        )
        .await;

    ensure!(
        matches!(result, Err(RegistryError::OutsideOrganization(id)) if id == own),
        "expected cross-organization refusal, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn managers_only_revoke_their_own_employees(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    let acme_manager = UserId::new(1);
    let globex_manager = UserId::new(3);
    with_manager(&service, acme_manager, "Acme").await?;
    with_manager(&service, globex_manager, "Globex").await?;
    service.register(UserId::new(2), "Eve Employee").await?;
    service
        .assign_role(AssignRoleRequest::new(
            acme_manager,
            UserId::new(2),
            Role::Employee,
        ))
        .await?;

    let result = service.revoke_role(globex_manager, UserId::new(2)).await;

    ensure!(
        matches!(result, Err(RegistryError::NotEligible { current: Role::Employee, .. })),
        "expected refusal, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn only_plain_users_can_be_promoted(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    let manager = UserId::new(1);
    let organization = with_manager(&service, manager, "Acme").await?;

    let result = service
        .assign_role(
            AssignRoleRequest::new(ADMIN, manager, Role::Manager).with_organization(organization),
        )
        .await;

    ensure!(
        matches!(result, Err(RegistryError::NotEligible { current: Role::Manager, .. })),
        "expected ineligible target, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_an_organization_demotes_members_and_drops_tasks(
    store: Arc<InMemoryStore>,
) -> Result<()> {
    let service = registry(&store);
    let tasks = TaskLifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::new(DefaultClock),
        OrphanPolicy::Retain,
    );
    let manager = UserId::new(1);
    let organization = with_manager(&service, manager, "Acme").await?;
    for employee in [2, 3] {
        let id = UserId::new(employee);
        service.register(id, "Eve Employee").await?;
        service
            .assign_role(AssignRoleRequest::new(manager, id, Role::Employee))
            .await?;
        tasks
            .create_task(CreateTaskRequest::new(manager, id, "Ship box", "Box"))
            .await?;
    }

    let removal = service.delete_organization(ADMIN, organization).await?;

    assert_eq!(
        removal.demoted,
        vec![UserId::new(1), UserId::new(2), UserId::new(3)]
    );
    assert_eq!(removal.removed_tasks, 2);
    assert!(service.find_organization(organization).await?.is_none());
    for id in removal.demoted {
        let user = service.find_user(id).await?;
        assert_eq!(user.as_ref().map(User::membership), Some(Membership::Unassigned));
    }
    let stats = service.statistics(ADMIN).await?;
    assert_eq!(stats.total_tasks, 0);
    assert_eq!(stats.total_organizations, 0);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_a_missing_organization_is_not_found(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    service.register(ADMIN, "Ada Admin").await?;

    let result = service
        .delete_organization(ADMIN, OrganizationId::new(5))
        .await;

    ensure!(
        matches!(result, Err(RegistryError::OrganizationNotFound(_))),
        "expected not found, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reset_keeps_only_the_admin(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    with_manager(&service, UserId::new(1), "Acme").await?;
    service.register(UserId::new(2), "Pat Plain").await?;

    let removed = service.reset_all(ADMIN).await?;

    assert_eq!(removed, vec![UserId::new(1), UserId::new(2)]);
    let remaining = service.list_users(ADMIN).await?;
    assert!(remaining.is_empty());
    assert!(service.list_organizations(ADMIN).await?.is_empty());
    assert!(service.find_user(ADMIN).await?.is_some());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn broadcast_reaches_everyone_but_the_sender(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    service.register(ADMIN, "Ada Admin").await?;
    for id in 1..=3 {
        service.register(UserId::new(id), "Pat Plain").await?;
    }

    let recipients = service.broadcast_recipients(ADMIN).await?;

    assert_eq!(
        recipients,
        vec![UserId::new(1), UserId::new(2), UserId::new(3)]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn statistics_count_roles_and_tasks(store: Arc<InMemoryStore>) -> Result<()> {
    let service = registry(&store);
    let tasks = TaskLifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::new(DefaultClock),
        OrphanPolicy::Retain,
    );
    let manager = UserId::new(1);
    with_manager(&service, manager, "Acme").await?;
    let employee = UserId::new(2);
    service.register(employee, "Eve Employee").await?;
    service
        .assign_role(AssignRoleRequest::new(manager, employee, Role::Employee))
        .await?;
    let task = tasks
        .create_task(CreateTaskRequest::new(manager, employee, "Ship box", "Box"))
        .await?;
    tasks
        .set_status(task.id(), TaskStatus::Completed, employee)
        .await?;

    let stats = service.statistics(ADMIN).await?;

    assert_eq!(stats.total_users, 3);
    assert_eq!(stats.managers, 1);
    assert_eq!(stats.employees, 1);
    assert_eq!(stats.total_tasks, 1);
    let completed = stats
        .tasks_by_status
        .iter()
        .find(|entry| entry.status == TaskStatus::Completed)
        .map(|entry| entry.count);
    assert_eq!(completed, Some(1));
    assert_eq!(
        stats
            .completed_per_employee
            .iter()
            .map(|entry| (entry.name.as_str(), entry.count))
            .collect::<Vec<_>>(),
        vec![("Eve Employee", 1)]
    );
    Ok(())
}
