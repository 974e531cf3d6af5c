//! In-memory integration tests for the user and organization registry.

use super::helpers::{ADMIN, EMPLOYEE, MANAGER, NEWCOMER, Office, office};
use rstest::rstest;
use taskbot::directory::{
    domain::{NamedCount, Role, UserId},
    services::{AssignRoleRequest, RegistryError},
};
use taskbot::task::domain::TaskStatus;

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn deleting_organization_demotes_members_and_drops_tasks(
    office: Office,
) -> eyre::Result<()> {
    let organization = office.staff().await?;
    let first = office.hand_out("Inventory").await?;
    office.hand_out("Payroll").await?;

    let removal = office.registry.delete_organization(ADMIN, organization).await?;

    assert_eq!(removal.demoted, vec![MANAGER, EMPLOYEE]);
    assert_eq!(removal.removed_tasks, 2);
    assert!(office.tasks.find_task(first).await?.is_none());
    for member in [MANAGER, EMPLOYEE] {
        let user = office
            .registry
            .find_user(member)
            .await?
            .ok_or_else(|| eyre::eyre!("member {member} vanished"))?;
        assert_eq!(user.role(), Role::User);
        assert_eq!(user.organization(), None);
    }
    assert!(office.registry.list_organizations(ADMIN).await?.is_empty());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn demoted_manager_can_be_promoted_elsewhere(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    let globex = office.registry.create_organization(ADMIN, "Globex").await?;

    office.registry.revoke_role(ADMIN, MANAGER).await?;
    let change = office
        .registry
        .assign_role(
            AssignRoleRequest::new(ADMIN, MANAGER, Role::Manager).with_organization(globex.id()),
        )
        .await?;

    assert_eq!(change.user.role(), Role::Manager);
    assert_eq!(change.user.organization(), Some(globex.id()));
    assert_eq!(change.previous.role(), Role::User);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn managers_cannot_take_members_of_other_organizations(
    office: Office,
) -> eyre::Result<()> {
    office.staff().await?;

    let result = office
        .registry
        .assign_role(AssignRoleRequest::new(MANAGER, EMPLOYEE, Role::Employee))
        .await;

    assert!(
        matches!(result, Err(RegistryError::NotEligible { current: Role::Employee, .. })),
        "expected NotEligible, got {result:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn statistics_summarize_the_office(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    let done = office.hand_out("Inventory").await?;
    office.hand_out("Payroll").await?;
    office
        .tasks
        .set_status(done, TaskStatus::Completed, EMPLOYEE)
        .await?;

    let stats = office.registry.statistics(ADMIN).await?;

    assert_eq!(stats.total_users, 4);
    assert_eq!(stats.total_organizations, 1);
    assert_eq!((stats.managers, stats.employees), (1, 1));
    assert_eq!(stats.total_tasks, 2);
    assert_eq!(
        stats.tasks_per_organization,
        vec![NamedCount::new("Acme", 2)]
    );
    assert_eq!(
        stats.completed_per_employee,
        vec![NamedCount::new("Eve Employee", 1)]
    );
    let by_status: Vec<(TaskStatus, u64)> = stats
        .tasks_by_status
        .iter()
        .map(|entry| (entry.status, entry.count))
        .collect();
    assert!(by_status.contains(&(TaskStatus::New, 1)));
    assert!(by_status.contains(&(TaskStatus::Completed, 1)));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn reset_keeps_only_the_administrator(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    office.hand_out("Inventory").await?;

    let mut removed = office.registry.reset_all(ADMIN).await?;
    removed.sort();

    assert_eq!(removed, vec![MANAGER, EMPLOYEE, NEWCOMER]);
    let stats = office.registry.statistics(ADMIN).await?;
    assert_eq!((stats.total_users, stats.total_tasks), (1, 0));
    let admin = office.registry.find_user(ADMIN).await?;
    assert_eq!(admin.map(|user| user.role()), Some(Role::Admin));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn broadcast_reaches_everyone_but_the_sender(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    office
        .registry
        .register(UserId::new(5000), "Late Arrival")
        .await?;

    let mut recipients = office.registry.broadcast_recipients(ADMIN).await?;
    recipients.sort();

    assert_eq!(
        recipients,
        vec![MANAGER, EMPLOYEE, NEWCOMER, UserId::new(5000)]
    );
    Ok(())
}
