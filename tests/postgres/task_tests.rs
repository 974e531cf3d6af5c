//! Task rows and status compare-and-set against `PostgreSQL`.

use std::sync::Arc;

use super::helpers::{EMPLOYEE, MANAGER, office};
use taskbot::task::{
    domain::{OrphanPolicy, TaskStatus},
    services::{CreateTaskRequest, StatusUpdate, TaskLifecycleError},
};

#[tokio::test(flavor = "multi_thread")]
async fn racing_status_changes_have_one_winner() -> eyre::Result<()> {
    let Some(office) = office(OrphanPolicy::Retain).await? else {
        return Ok(());
    };
    office.staff().await?;
    let id = office
        .tasks
        .create_task(CreateTaskRequest::new(
            MANAGER,
            EMPLOYEE,
            "Stocktake",
            "Count everything",
        ))
        .await?
        .id();
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
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn listings_are_ordered_and_carry_names() -> eyre::Result<()> {
    let Some(office) = office(OrphanPolicy::Retain).await? else {
        return Ok(());
    };
    office.staff().await?;
    let mut ids = Vec::new();
    for title in ["First", "Second", "Third"] {
        let task = office
            .tasks
            .create_task(CreateTaskRequest::new(MANAGER, EMPLOYEE, title, "Details"))
            .await?;
        ids.push(task.id());
    }

    let pending = office.tasks.pending_queue(EMPLOYEE).await?;
    let managed = office.tasks.list_managed(MANAGER, None).await?;

    assert_eq!(pending, ids);
    assert_eq!(
        managed
            .first()
            .map(|details| details.employee_name.as_str()),
        Some("Eve Employee")
    );
    assert_eq!(managed.len(), 3);
    Ok(())
}
