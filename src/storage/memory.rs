//! In-memory store for tests.
//!
//! Mirrors the cascade and compare-and-set semantics of the `PostgreSQL`
//! store. Every operation runs under one write or read lock, which makes it
//! atomic with respect to other operations on the same store.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::directory::{
    domain::{
        Membership, NamedCount, Organization, OrganizationId, OrganizationName, Role, Statistics,
        StatusCount, User, UserId,
    },
    ports::{
        DirectoryRepository, DirectoryRepositoryError, DirectoryRepositoryResult,
        OrganizationRemoval,
    },
};
use crate::task::{
    domain::{NewTask, PersistedTaskData, Task, TaskId, TaskStatus},
    ports::{TaskDetails, TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};

/// Thread-safe in-memory store.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<RwLock<StoreState>>,
}

#[derive(Debug, Default)]
struct StoreState {
    users: BTreeMap<UserId, User>,
    organizations: BTreeMap<OrganizationId, Organization>,
    tasks: BTreeMap<TaskId, Task>,
    last_organization_id: i64,
    last_task_id: i64,
}

impl InMemoryStore {
    /// Creates an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, StoreState>, std::io::Error> {
        self.state
            .read()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, StoreState>, std::io::Error> {
        self.state
            .write()
            .map_err(|err| std::io::Error::other(err.to_string()))
    }
}

fn with_status(task: &Task, status: TaskStatus) -> Task {
    Task::from_persisted(PersistedTaskData {
        id: task.id(),
        title: task.title().clone(),
        description: task.description().clone(),
        status,
        manager: task.manager(),
        employee: task.employee(),
        organization: task.organization(),
        created_at: task.created_at(),
    })
}

impl StoreState {
    fn details(&self, task: &Task) -> Option<TaskDetails> {
        let manager = self.users.get(&task.manager())?;
        let employee = self.users.get(&task.employee())?;
        Some(TaskDetails {
            task: task.clone(),
            manager_name: manager.full_name().clone(),
            employee_name: employee.full_name().clone(),
        })
    }

    fn list_tasks(&self, filter: TaskFilter, owner: impl Fn(&Task) -> bool) -> Vec<TaskDetails> {
        let mut matching: Vec<&Task> = self
            .tasks
            .values()
            .filter(|task| owner(task))
            .filter(|task| filter.status().is_none_or(|status| task.status() == status))
            .collect();
        matching.sort_by(|left, right| {
            right
                .created_at()
                .cmp(&left.created_at())
                .then_with(|| right.id().cmp(&left.id()))
        });
        let limit = filter.limit().unwrap_or(usize::MAX);
        matching
            .into_iter()
            .take(limit)
            .filter_map(|task| self.details(task))
            .collect()
    }

    fn count_tasks(&self, predicate: impl Fn(&Task) -> bool) -> u64 {
        self.tasks.values().filter(|task| predicate(task)).count() as u64
    }

    fn named_counts(
        &self,
        role: Role,
        predicate: impl Fn(&User, &Task) -> bool,
    ) -> Vec<NamedCount> {
        let mut counts: Vec<NamedCount> = self
            .users
            .values()
            .filter(|user| user.role() == role)
            .map(|user| {
                NamedCount::new(
                    user.full_name().as_str(),
                    self.count_tasks(|task| predicate(user, task)),
                )
            })
            .collect();
        counts.sort_by(|left, right| left.name.cmp(&right.name));
        counts
    }
}

fn lock_error(err: std::io::Error) -> DirectoryRepositoryError {
    DirectoryRepositoryError::persistence(err)
}

fn task_lock_error(err: std::io::Error) -> TaskRepositoryError {
    TaskRepositoryError::persistence(err)
}

#[async_trait]
impl DirectoryRepository for InMemoryStore {
    async fn insert_user(&self, user: &User) -> DirectoryRepositoryResult<()> {
        let mut state = self.write().map_err(lock_error)?;
        if state.users.contains_key(&user.id()) {
            return Err(DirectoryRepositoryError::DuplicateUser(user.id()));
        }
        if let Some(org) = user.organization()
            && !state.organizations.contains_key(&org)
        {
            return Err(DirectoryRepositoryError::OrganizationNotFound(org));
        }
        state.users.insert(user.id(), user.clone());
        Ok(())
    }

    async fn find_user(&self, id: UserId) -> DirectoryRepositoryResult<Option<User>> {
        let state = self.read().map_err(lock_error)?;
        Ok(state.users.get(&id).cloned())
    }

    async fn list_users(&self) -> DirectoryRepositoryResult<Vec<User>> {
        let state = self.read().map_err(lock_error)?;
        Ok(state.users.values().cloned().collect())
    }

    async fn list_users_with_role(&self, role: Role) -> DirectoryRepositoryResult<Vec<User>> {
        let state = self.read().map_err(lock_error)?;
        Ok(state
            .users
            .values()
            .filter(|user| user.role() == role)
            .cloned()
            .collect())
    }

    async fn list_members(
        &self,
        organization: OrganizationId,
        role: Role,
    ) -> DirectoryRepositoryResult<Vec<User>> {
        let state = self.read().map_err(lock_error)?;
        Ok(state
            .users
            .values()
            .filter(|user| user.role() == role && user.organization() == Some(organization))
            .cloned()
            .collect())
    }

    async fn replace_membership(
        &self,
        id: UserId,
        expected: Membership,
        next: Membership,
    ) -> DirectoryRepositoryResult<User> {
        let mut state = self.write().map_err(lock_error)?;
        if let Some(org) = next.organization()
            && !state.organizations.contains_key(&org)
        {
            return Err(DirectoryRepositoryError::OrganizationNotFound(org));
        }
        let user = state
            .users
            .get_mut(&id)
            .ok_or(DirectoryRepositoryError::UserNotFound(id))?;
        if user.membership() != expected {
            return Err(DirectoryRepositoryError::MembershipChanged(id));
        }
        *user = User::new(id, user.full_name().clone(), next);
        Ok(user.clone())
    }

    async fn insert_organization(
        &self,
        name: &OrganizationName,
    ) -> DirectoryRepositoryResult<Organization> {
        let mut state = self.write().map_err(lock_error)?;
        if state
            .organizations
            .values()
            .any(|existing| existing.name() == name)
        {
            return Err(DirectoryRepositoryError::DuplicateOrganizationName(
                name.clone(),
            ));
        }
        state.last_organization_id += 1;
        let id = OrganizationId::new(state.last_organization_id);
        let organization = Organization::new(id, name.clone());
        state.organizations.insert(id, organization.clone());
        Ok(organization)
    }

    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> DirectoryRepositoryResult<Option<Organization>> {
        let state = self.read().map_err(lock_error)?;
        Ok(state.organizations.get(&id).cloned())
    }

    async fn list_organizations(&self) -> DirectoryRepositoryResult<Vec<Organization>> {
        let state = self.read().map_err(lock_error)?;
        Ok(state.organizations.values().cloned().collect())
    }

    async fn delete_organization(
        &self,
        id: OrganizationId,
    ) -> DirectoryRepositoryResult<OrganizationRemoval> {
        let mut state = self.write().map_err(lock_error)?;
        let organization = state
            .organizations
            .remove(&id)
            .ok_or(DirectoryRepositoryError::OrganizationNotFound(id))?;

        let mut demoted = Vec::new();
        for user in state.users.values_mut() {
            if user.organization() == Some(id) {
                demoted.push(user.id());
                *user = User::new(user.id(), user.full_name().clone(), Membership::Unassigned);
            }
        }

        let before = state.tasks.len();
        state.tasks.retain(|_, task| task.organization() != id);
        let removed_tasks = (before - state.tasks.len()) as u64;

        Ok(OrganizationRemoval {
            organization,
            demoted,
            removed_tasks,
        })
    }

    async fn reset(&self) -> DirectoryRepositoryResult<Vec<UserId>> {
        let mut state = self.write().map_err(lock_error)?;
        state.tasks.clear();
        state.organizations.clear();
        let removed: Vec<UserId> = state
            .users
            .values()
            .filter(|user| user.role() != Role::Admin)
            .map(User::id)
            .collect();
        state.users.retain(|_, user| user.role() == Role::Admin);
        Ok(removed)
    }

    async fn statistics(&self) -> DirectoryRepositoryResult<Statistics> {
        let state = self.read().map_err(lock_error)?;
        let count_role = |role: Role| {
            state
                .users
                .values()
                .filter(|user| user.role() == role)
                .count() as u64
        };

        let mut tasks_per_organization: Vec<NamedCount> = state
            .organizations
            .values()
            .map(|org| {
                NamedCount::new(
                    org.name().as_str(),
                    state.count_tasks(|task| task.organization() == org.id()),
                )
            })
            .collect();
        tasks_per_organization.sort_by(|left, right| left.name.cmp(&right.name));

        let mut completed_per_employee = state.named_counts(Role::Employee, |user, task| {
            task.employee() == user.id() && task.status() == TaskStatus::Completed
        });
        completed_per_employee.retain(|entry| entry.count > 0);

        Ok(Statistics {
            total_users: state.users.len() as u64,
            total_organizations: state.organizations.len() as u64,
            total_tasks: state.tasks.len() as u64,
            tasks_by_status: TaskStatus::ALL
                .into_iter()
                .map(|status| StatusCount {
                    status,
                    count: state.count_tasks(|task| task.status() == status),
                })
                .collect(),
            managers: count_role(Role::Manager),
            employees: count_role(Role::Employee),
            tasks_per_organization,
            tasks_per_manager: state
                .named_counts(Role::Manager, |user, task| task.manager() == user.id()),
            completed_per_employee,
        })
    }
}

#[async_trait]
impl TaskRepository for InMemoryStore {
    async fn insert(&self, task: &NewTask) -> TaskRepositoryResult<Task> {
        let mut state = self.write().map_err(task_lock_error)?;
        let manager_ok = state
            .users
            .get(&task.manager)
            .is_some_and(|user| user.membership().is_manager_of(task.organization));
        if !manager_ok {
            return Err(TaskRepositoryError::MembershipChanged(task.manager));
        }
        let employee_ok = state
            .users
            .get(&task.employee)
            .is_some_and(|user| user.membership().is_employee_of(task.organization));
        if !employee_ok {
            return Err(TaskRepositoryError::MembershipChanged(task.employee));
        }

        state.last_task_id += 1;
        let stored = task.clone().into_task(TaskId::new(state.last_task_id));
        state.tasks.insert(stored.id(), stored.clone());
        Ok(stored)
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        let state = self.read().map_err(task_lock_error)?;
        Ok(state.tasks.get(&id).cloned())
    }

    async fn compare_and_set_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
    ) -> TaskRepositoryResult<bool> {
        let mut state = self.write().map_err(task_lock_error)?;
        let task = state
            .tasks
            .get_mut(&id)
            .ok_or(TaskRepositoryError::NotFound(id))?;
        if task.status() != expected {
            return Ok(false);
        }
        *task = with_status(task, next);
        Ok(true)
    }

    async fn list_for_employee(
        &self,
        employee: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>> {
        let state = self.read().map_err(task_lock_error)?;
        Ok(state.list_tasks(filter, |task| task.employee() == employee))
    }

    async fn list_for_manager(
        &self,
        manager: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>> {
        let state = self.read().map_err(task_lock_error)?;
        Ok(state.list_tasks(filter, |task| task.manager() == manager))
    }

    async fn pending_for_employee(&self, employee: UserId) -> TaskRepositoryResult<Vec<TaskId>> {
        let state = self.read().map_err(task_lock_error)?;
        let mut pending: Vec<&Task> = state
            .tasks
            .values()
            .filter(|task| {
                task.employee() == employee
                    && matches!(task.status(), TaskStatus::New | TaskStatus::Accepted)
            })
            .collect();
        pending.sort_by(|left, right| {
            left.created_at()
                .cmp(&right.created_at())
                .then_with(|| left.id().cmp(&right.id()))
        });
        Ok(pending.into_iter().map(Task::id).collect())
    }
}
