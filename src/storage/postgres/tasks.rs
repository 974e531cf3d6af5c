//! Task port implementation for [`PostgresStore`].

use super::{
    PostgresStore,
    models::{NewTaskRow, TaskDetailsRow, TaskRow, UserRow},
    schema::{tasks, users},
};
use crate::directory::domain::{FullName, OrganizationId, Role, UserId};
use crate::task::{
    domain::{
        NewTask, PersistedTaskData, Task, TaskDescription, TaskId, TaskStatus, TaskTitle,
    },
    ports::{TaskDetails, TaskFilter, TaskRepository, TaskRepositoryError, TaskRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Nullable, Varchar};

const EMPLOYEE_TASKS_SQL: &str = concat!(
    "SELECT t.id, t.title, t.description, t.employee_id, t.manager_id, t.organization_id, ",
    "t.status, t.created_at, m.full_name AS manager_name, e.full_name AS employee_name ",
    "FROM tasks t ",
    "JOIN users m ON m.id = t.manager_id ",
    "JOIN users e ON e.id = t.employee_id ",
    "WHERE t.employee_id = $1 AND ($2::VARCHAR IS NULL OR t.status = $2) ",
    "ORDER BY t.created_at DESC, t.id DESC ",
    "LIMIT $3",
);

const MANAGER_TASKS_SQL: &str = concat!(
    "SELECT t.id, t.title, t.description, t.employee_id, t.manager_id, t.organization_id, ",
    "t.status, t.created_at, m.full_name AS manager_name, e.full_name AS employee_name ",
    "FROM tasks t ",
    "JOIN users m ON m.id = t.manager_id ",
    "JOIN users e ON e.id = t.employee_id ",
    "WHERE t.manager_id = $1 AND ($2::VARCHAR IS NULL OR t.status = $2) ",
    "ORDER BY t.created_at DESC, t.id DESC ",
    "LIMIT $3",
);

struct TaskColumns {
    id: i64,
    title: String,
    description: String,
    employee_id: i64,
    manager_id: i64,
    organization_id: i64,
    status: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl From<TaskRow> for TaskColumns {
    fn from(row: TaskRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            description: row.description,
            employee_id: row.employee_id,
            manager_id: row.manager_id,
            organization_id: row.organization_id,
            status: row.status,
            created_at: row.created_at,
        }
    }
}

fn columns_to_task(columns: TaskColumns) -> TaskRepositoryResult<Task> {
    let status = TaskStatus::try_from(columns.status.as_str())
        .map_err(TaskRepositoryError::persistence)?;
    let title = TaskTitle::new(columns.title).map_err(TaskRepositoryError::persistence)?;
    let description =
        TaskDescription::new(columns.description).map_err(TaskRepositoryError::persistence)?;
    Ok(Task::from_persisted(PersistedTaskData {
        id: TaskId::new(columns.id),
        title,
        description,
        status,
        manager: UserId::new(columns.manager_id),
        employee: UserId::new(columns.employee_id),
        organization: OrganizationId::new(columns.organization_id),
        created_at: columns.created_at,
    }))
}

fn row_to_task(row: TaskRow) -> TaskRepositoryResult<Task> {
    columns_to_task(TaskColumns::from(row))
}

fn row_to_details(row: TaskDetailsRow) -> TaskRepositoryResult<TaskDetails> {
    let TaskDetailsRow {
        id,
        title,
        description,
        employee_id,
        manager_id,
        organization_id,
        status,
        created_at,
        manager_name,
        employee_name,
    } = row;
    let task = columns_to_task(TaskColumns {
        id,
        title,
        description,
        employee_id,
        manager_id,
        organization_id,
        status,
        created_at,
    })?;
    Ok(TaskDetails {
        task,
        manager_name: FullName::new(manager_name).map_err(TaskRepositoryError::persistence)?,
        employee_name: FullName::new(employee_name).map_err(TaskRepositoryError::persistence)?,
    })
}

/// Locks the user row and checks it still holds `role` in `organization`.
fn holds_role(
    connection: &mut PgConnection,
    user: UserId,
    role: Role,
    organization: OrganizationId,
) -> TaskRepositoryResult<bool> {
    let row = users::table
        .find(user.value())
        .select(UserRow::as_select())
        .for_share()
        .get_result::<UserRow>(connection)
        .optional()?;
    Ok(row.is_some_and(|found| {
        found.role == role.as_str() && found.organization_id == Some(organization.value())
    }))
}

fn list_details(
    connection: &mut PgConnection,
    sql: &'static str,
    owner: UserId,
    filter: TaskFilter,
) -> TaskRepositoryResult<Vec<TaskDetails>> {
    let limit = filter
        .limit()
        .map(i64::try_from)
        .transpose()
        .map_err(TaskRepositoryError::persistence)?;
    diesel::sql_query(sql)
        .bind::<BigInt, _>(owner.value())
        .bind::<Nullable<Varchar>, _>(filter.status().map(TaskStatus::as_str))
        .bind::<Nullable<BigInt>, _>(limit)
        .load::<TaskDetailsRow>(connection)?
        .into_iter()
        .map(row_to_details)
        .collect()
}

#[async_trait]
impl TaskRepository for PostgresStore {
    async fn insert(&self, task: &NewTask) -> TaskRepositoryResult<Task> {
        let pending = task.clone();
        self.run_blocking(move |connection| {
            connection.transaction::<_, TaskRepositoryError, _>(|tx| {
                let organization = pending.organization;
                if !holds_role(tx, pending.manager, Role::Manager, organization)? {
                    return Err(TaskRepositoryError::MembershipChanged(pending.manager));
                }
                if !holds_role(tx, pending.employee, Role::Employee, organization)? {
                    return Err(TaskRepositoryError::MembershipChanged(pending.employee));
                }

                let row = diesel::insert_into(tasks::table)
                    .values(&NewTaskRow {
                        title: pending.title.as_str(),
                        description: pending.description.as_str(),
                        employee_id: pending.employee.value(),
                        manager_id: pending.manager.value(),
                        organization_id: organization.value(),
                        status: TaskStatus::New.as_str(),
                        created_at: pending.created_at,
                    })
                    .returning(TaskRow::as_returning())
                    .get_result::<TaskRow>(tx)?;
                row_to_task(row)
            })
        })
        .await
    }

    async fn find_by_id(&self, id: TaskId) -> TaskRepositoryResult<Option<Task>> {
        self.run_blocking(move |connection| {
            let row = tasks::table
                .find(id.value())
                .select(TaskRow::as_select())
                .first::<TaskRow>(connection)
                .optional()?;
            row.map(row_to_task).transpose()
        })
        .await
    }

    async fn compare_and_set_status(
        &self,
        id: TaskId,
        expected: TaskStatus,
        next: TaskStatus,
    ) -> TaskRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let updated = diesel::update(
                tasks::table
                    .filter(tasks::id.eq(id.value()))
                    .filter(tasks::status.eq(expected.as_str())),
            )
            .set(tasks::status.eq(next.as_str()))
            .execute(connection)?;
            if updated > 0 {
                return Ok(true);
            }
            let exists = diesel::select(diesel::dsl::exists(
                tasks::table.filter(tasks::id.eq(id.value())),
            ))
            .get_result::<bool>(connection)?;
            if exists {
                Ok(false)
            } else {
                Err(TaskRepositoryError::NotFound(id))
            }
        })
        .await
    }

    async fn list_for_employee(
        &self,
        employee: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>> {
        self.run_blocking(move |connection| {
            list_details(connection, EMPLOYEE_TASKS_SQL, employee, filter)
        })
        .await
    }

    async fn list_for_manager(
        &self,
        manager: UserId,
        filter: TaskFilter,
    ) -> TaskRepositoryResult<Vec<TaskDetails>> {
        self.run_blocking(move |connection| {
            list_details(connection, MANAGER_TASKS_SQL, manager, filter)
        })
        .await
    }

    async fn pending_for_employee(&self, employee: UserId) -> TaskRepositoryResult<Vec<TaskId>> {
        self.run_blocking(move |connection| {
            let ids = tasks::table
                .filter(tasks::employee_id.eq(employee.value()))
                .filter(tasks::status.eq_any([
                    TaskStatus::New.as_str(),
                    TaskStatus::Accepted.as_str(),
                ]))
                .order((tasks::created_at.asc(), tasks::id.asc()))
                .select(tasks::id)
                .load::<i64>(connection)?;
            Ok(ids.into_iter().map(TaskId::new).collect())
        })
        .await
    }
}

