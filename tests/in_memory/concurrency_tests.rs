//! Racing updates against the shared in-memory store.

use std::collections::BTreeSet;
use std::sync::Arc;

use super::helpers::{ADMIN, EMPLOYEE, NEWCOMER, Office, office};
use rstest::rstest;
use taskbot::directory::{
    domain::Role,
    services::{AssignRoleRequest, RegistryError},
};
use taskbot::task::{
    domain::TaskStatus,
    services::{StatusUpdate, TaskLifecycleError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_terminal_statuses_have_one_winner(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    let id = office.hand_out("Inventory").await?;
    let office = Arc::new(office);

    let handles: Vec<_> = [TaskStatus::Completed, TaskStatus::Rejected]
        .into_iter()
        .map(|target| {
            let shared = Arc::clone(&office);
            tokio::spawn(async move { shared.tasks.set_status(id, target, EMPLOYEE).await })
        })
        .collect();
    let mut winners = Vec::new();
    let mut losers = Vec::new();
    for handle in handles {
        match handle.await? {
            Ok(StatusUpdate::Changed { task, .. }) => winners.push(task.status()),
            Err(TaskLifecycleError::InvalidTransition { from, .. }) => losers.push(from),
            other => return Err(eyre::eyre!("unexpected outcome: {other:?}")),
        }
    }

    assert_eq!(winners.len(), 1);
    assert_eq!(losers, winners);
    let stored = office
        .tasks
        .find_task(id)
        .await?
        .ok_or_else(|| eyre::eyre!("task vanished"))?;
    assert!(stored.status().is_terminal());
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn racing_promotions_grant_one_role(office: Office) -> eyre::Result<()> {
    let acme = office.staff().await?;
    let globex = office.registry.create_organization(ADMIN, "Globex").await?.id();
    let office = Arc::new(office);

    let handles: Vec<_> = [acme, globex]
        .into_iter()
        .map(|organization| {
            let shared = Arc::clone(&office);
            tokio::spawn(async move {
                shared
                    .registry
                    .assign_role(
                        AssignRoleRequest::new(ADMIN, NEWCOMER, Role::Manager)
                            .with_organization(organization),
                    )
                    .await
            })
        })
        .collect();
    let mut granted = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => granted += 1,
            Err(RegistryError::NotEligible { .. } | RegistryError::MembershipChanged(_)) => {}
            Err(other) => return Err(other.into()),
        }
    }

    assert_eq!(granted, 1);
    let user = office
        .registry
        .find_user(NEWCOMER)
        .await?
        .ok_or_else(|| eyre::eyre!("user vanished"))?;
    assert_eq!(user.role(), Role::Manager);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn parallel_hand_outs_get_distinct_ids(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    let office = Arc::new(office);

    let handles: Vec<_> = (0..20)
        .map(|index| {
            let shared = Arc::clone(&office);
            tokio::spawn(async move { shared.hand_out(&format!("Task {index}")).await })
        })
        .collect();
    let mut ids = BTreeSet::new();
    for handle in handles {
        ids.insert(handle.await??);
    }

    assert_eq!(ids.len(), 20);
    assert_eq!(office.tasks.pending_queue(EMPLOYEE).await?.len(), 20);
    Ok(())
}
