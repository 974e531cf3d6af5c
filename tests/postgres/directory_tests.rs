//! Directory operations against `PostgreSQL`.

use super::helpers::{ADMIN, EMPLOYEE, MANAGER, NEWCOMER, office};
use taskbot::directory::{
    domain::{NamedCount, Role},
    services::RegistryError,
};
use taskbot::task::{
    domain::OrphanPolicy,
    services::CreateTaskRequest,
};

#[tokio::test(flavor = "multi_thread")]
async fn schema_bootstrap_is_idempotent() -> eyre::Result<()> {
    let Some(office) = office(OrphanPolicy::Retain).await? else {
        return Ok(());
    };

    office.store.bootstrap_schema().await?;
    office.store.bootstrap_schema().await?;

    assert!(office.registry.list_organizations(ADMIN).await.is_err());
    office.registry.register(ADMIN, "Ada Admin").await?;
    assert!(office.registry.list_organizations(ADMIN).await?.is_empty());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_registrations_and_names_are_refused() -> eyre::Result<()> {
    let Some(office) = office(OrphanPolicy::Retain).await? else {
        return Ok(());
    };
    office.staff().await?;

    let again = office.registry.register(MANAGER, "Someone Else").await;
    let duplicate = office.registry.create_organization(ADMIN, "Acme").await;

    assert!(matches!(again, Err(RegistryError::AlreadyRegistered(id)) if id == MANAGER));
    assert!(matches!(duplicate, Err(RegistryError::DuplicateName(_))));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn deleting_organization_cascades_in_one_transaction() -> eyre::Result<()> {
    let Some(office) = office(OrphanPolicy::Retain).await? else {
        return Ok(());
    };
    let organization = office.staff().await?;
    let task = office
        .tasks
        .create_task(CreateTaskRequest::new(
            MANAGER,
            EMPLOYEE,
            "Stocktake",
            "Count everything",
        ))
        .await?;

    let removal = office.registry.delete_organization(ADMIN, organization).await?;

    assert_eq!(removal.demoted, vec![MANAGER, EMPLOYEE]);
    assert_eq!(removal.removed_tasks, 1);
    assert!(office.tasks.find_task(task.id()).await?.is_none());
    let manager = office.registry.find_user(MANAGER).await?;
    assert_eq!(manager.map(|user| user.role()), Some(Role::User));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn statistics_and_reset() -> eyre::Result<()> {
    let Some(office) = office(OrphanPolicy::Retain).await? else {
        return Ok(());
    };
    office.staff().await?;
    office
        .tasks
        .create_task(CreateTaskRequest::new(
            MANAGER,
            EMPLOYEE,
            "Stocktake",
            "Count everything",
        ))
        .await?;

    let stats = office.registry.statistics(ADMIN).await?;
    assert_eq!(stats.total_users, 4);
    assert_eq!((stats.managers, stats.employees), (1, 1));
    assert_eq!(stats.tasks_per_organization, vec![NamedCount::new("Acme", 1)]);
    assert_eq!(
        stats.tasks_per_manager,
        vec![NamedCount::new("Mona Manager", 1)]
    );

    let mut removed = office.registry.reset_all(ADMIN).await?;
    removed.sort();
    assert_eq!(removed, vec![MANAGER, EMPLOYEE, NEWCOMER]);
    let after = office.registry.statistics(ADMIN).await?;
    assert_eq!((after.total_users, after.total_tasks), (1, 0));
    Ok(())
}
