//! Status changes decided on a status that another update already replaced.
//!
//! The wrapped repository commits a competing update right before the
//! service's compare-and-set, so the interleaving is deterministic.

use std::sync::{Arc, Mutex};

use super::helpers::{EMPLOYEE, MANAGER, Office};
use async_trait::async_trait;
use mockable::DefaultClock;
use rstest::rstest;
use taskbot::directory::domain::UserId;
use taskbot::storage::memory::InMemoryStore;
use taskbot::task::{
    domain::{NewTask, OrphanPolicy, Task, TaskId, TaskStatus},
    ports::{TaskDetails, TaskFilter, TaskRepository, TaskRepositoryResult},
    services::{CreateTaskRequest, StatusUpdate, TaskLifecycleError, TaskLifecycleService},
};

/// Delegates to the shared store and slips one competing status write in
/// before the first compare-and-set it sees.
struct InterleavedWriter {
    store: Arc<InMemoryStore>,
    competing: Mutex<Option<TaskStatus>>,
}

impl InterleavedWriter {
    fn new(store: Arc<InMemoryStore>, competing: TaskStatus) -> Self {
        Self {
            store,
            competing: Mutex::new(Some(competing)),
        }
    }

    fn take_competing(&self) -> Option<TaskStatus> {
        self.competing
            .lock()
            .ok()
            .and_then(|mut pending| pending.take())
    }
}

#[async_trait]
impl TaskRepository for InterleavedWriter {
    async fn insert(&self, task: &NewTask) -> TaskRepositoryResult<Task> {
        self.store.insert(task).await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.store.find_by_id(id).await
    }

    async fn compare_and_set_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
    ) -> TaskRepositoryResult<bool> {
        if let Some(competing) = self.take_competing() {
            self.store
                .compare_and_set_status(id, expected, competing)
                .await?;
        }
        self.store.compare_and_set_status(id, expected, next).await
    }

    async fn list_for_employee(
        &self,
        employee: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>> {
        self.store.list_for_employee(employee, filter).await
    }

    async fn list_for_manager(
        &self,
        manager: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>> {
        self.store.list_for_manager(manager, filter).await
    }

    async fn pending_for_employee(
        &self,
        employee: UserId,
    ) -> TaskRepositoryResult<Vec<TaskId>> {
        self.store.pending_for_employee(employee).await
    }
}

/// Staffs a store, hands out one task in `new` and returns a service whose
/// next status write loses to `competing`.
async fn racing_service(
    competing: TaskStatus,
) -> eyre::Result<(
    TaskLifecycleService<InterleavedWriter, InMemoryStore, DefaultClock>,
    TaskId,
)> {
    let office = Office::new(OrphanPolicy::Retain);
    office.staff().await?;
    let task = office
        .tasks
        .create_task(CreateTaskRequest::new(
            MANAGER,
            EMPLOYEE,
            "Quarterly report",
            "Draft and circulate",
        ))
        .await?;
    let service = TaskLifecycleService::new(
        Arc::new(InterleavedWriter::new(Arc::clone(&office.store), competing)),
        Arc::clone(&office.store),
        Arc::new(DefaultClock),
        OrphanPolicy::Retain,
    );
    Ok((service, task.id()))
}

#[rstest]
#[case::accepted_beats_completed(TaskStatus::Accepted, TaskStatus::Completed)]
#[case::completed_beats_accepted(TaskStatus::Completed, TaskStatus::Accepted)]
#[case::rejected_beats_completed(TaskStatus::Rejected, TaskStatus::Completed)]
#[tokio::test(flavor = "multi_thread")]
async fn losing_write_reports_the_observed_status(
    #[case] winner: TaskStatus,
    #[case] requested: TaskStatus,
) -> eyre::Result<()> {
    let (service, id) = racing_service(winner).await?;

    let result = service.set_status(id, requested, EMPLOYEE).await;

    match result {
        Err(TaskLifecycleError::InvalidTransition { task, from, to }) => {
            assert_eq!(task, id);
            assert_eq!(from, winner);
            assert_eq!(to, requested);
        }
        other => return Err(eyre::eyre!("expected InvalidTransition, got {other:?}")),
    }
    let stored = service
        .find_task(id)
        .await?
        .ok_or_else(|| eyre::eyre!("task vanished"))?;
    assert_eq!(stored.status(), winner);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn losing_write_to_the_same_status_is_already_in_state() -> eyre::Result<()> {
    let (service, id) = racing_service(TaskStatus::Accepted).await?;

    let update = service
        .set_status(id, TaskStatus::Accepted, EMPLOYEE)
        .await?;

    match update {
        StatusUpdate::AlreadyInState { task } => {
            assert_eq!(task.status(), TaskStatus::Accepted);
        }
        StatusUpdate::Changed { .. } => {
            return Err(eyre::eyre!("the losing write must not report a change"));
        }
    }
    Ok(())
}
