//! In-memory integration tests for task hand-out and status changes.

use super::helpers::{EMPLOYEE, MANAGER, NEWCOMER, Office, office};
use rstest::rstest;
use taskbot::directory::{
    domain::{AccessDenied, Role},
    services::AssignRoleRequest,
};
use taskbot::task::{
    domain::{OrphanPolicy, TaskStatus},
    services::{CreateTaskRequest, StatusUpdate, TaskLifecycleError},
};

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn task_walks_from_new_to_completed(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    let id = office.hand_out("Inventory").await?;

    let accepted = office
        .tasks
        .set_status(id, TaskStatus::Accepted, EMPLOYEE)
        .await?;
    let completed = office
        .tasks
        .set_status(id, TaskStatus::Completed, EMPLOYEE)
        .await?;

    assert!(matches!(
        accepted,
        StatusUpdate::Changed { previous: TaskStatus::New, .. }
    ));
    assert!(matches!(
        completed,
        StatusUpdate::Changed { previous: TaskStatus::Accepted, .. }
    ));
    assert_eq!(completed.task().status(), TaskStatus::Completed);

    let again = office
        .tasks
        .set_status(id, TaskStatus::Accepted, EMPLOYEE)
        .await;
    assert!(
        matches!(again, Err(TaskLifecycleError::InvalidTransition { .. })),
        "terminal task changed: {again:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn listings_follow_the_role_of_the_caller(office: Office) -> eyre::Result<()> {
    office.staff().await?;
    office.hand_out("Inventory").await?;
    let second = office.hand_out("Payroll").await?;
    office
        .tasks
        .set_status(second, TaskStatus::Rejected, EMPLOYEE)
        .await?;

    let managed = office.tasks.list_managed(MANAGER, None).await?;
    let rejected = office
        .tasks
        .list_assigned(EMPLOYEE, Some(TaskStatus::Rejected))
        .await?;
    let pending = office.tasks.pending_queue(EMPLOYEE).await?;

    assert_eq!(managed.len(), 2);
    assert_eq!(rejected.len(), 1);
    assert_eq!(
        rejected.first().map(|details| details.manager_name.as_str()),
        Some("Mona Manager")
    );
    assert_eq!(pending.len(), 1);

    let refused = office.tasks.list_managed(EMPLOYEE, None).await;
    assert!(
        matches!(refused, Err(TaskLifecycleError::Forbidden(AccessDenied::Role { .. }))),
        "employee listed managed tasks: {refused:?}"
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn tasks_cannot_go_to_plain_users(office: Office) -> eyre::Result<()> {
    office.staff().await?;

    let result = office
        .tasks
        .create_task(CreateTaskRequest::new(
            MANAGER,
            NEWCOMER,
            "Inventory",
            "Count the chairs",
        ))
        .await;

    assert!(
        matches!(result, Err(TaskLifecycleError::OrganizationMismatch { .. })),
        "task handed to a plain user: {result:?}"
    );
    Ok(())
}

#[rstest]
#[case(OrphanPolicy::Retain, true)]
#[case(OrphanPolicy::Freeze, false)]
#[tokio::test(flavor = "multi_thread")]
async fn demoted_employee_tasks_follow_the_orphan_policy(
    #[case] policy: OrphanPolicy,
    #[case] actionable: bool,
) -> eyre::Result<()> {
    let office = Office::new(policy);
    office.staff().await?;
    let id = office.hand_out("Inventory").await?;
    office.registry.revoke_role(MANAGER, EMPLOYEE).await?;
    office
        .registry
        .assign_role(AssignRoleRequest::new(MANAGER, NEWCOMER, Role::Employee))
        .await?;

    let result = office
        .tasks
        .set_status(id, TaskStatus::Accepted, EMPLOYEE)
        .await;

    if actionable {
        assert!(result.is_ok(), "retained task refused: {result:?}");
    } else {
        assert!(
            matches!(result, Err(TaskLifecycleError::Frozen(_))),
            "frozen task changed: {result:?}"
        );
    }
    Ok(())
}
