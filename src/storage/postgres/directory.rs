//! Directory port implementation for [`PostgresStore`].

use super::{
    PostgresStore,
    models::{NamedCountRow, NewOrganizationRow, OrganizationRow, StatusCountRow, UserRow},
    schema::{organizations, tasks, users},
    to_count,
};
use crate::directory::{
    domain::{
        FullName, Membership, NamedCount, Organization, OrganizationId, OrganizationName, Role,
        Statistics, StatusCount, User, UserId,
    },
    ports::{
        DirectoryRepository, DirectoryRepositoryError, DirectoryRepositoryResult,
        OrganizationRemoval,
    },
};
use crate::task::domain::TaskStatus;
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

const TASKS_PER_ORGANIZATION_SQL: &str = concat!(
    "SELECT o.name AS name, COUNT(t.id) AS count ",
    "FROM organizations o LEFT JOIN tasks t ON t.organization_id = o.id ",
    "GROUP BY o.id, o.name ORDER BY o.name",
);

const TASKS_PER_MANAGER_SQL: &str = concat!(
    "SELECT u.full_name AS name, COUNT(t.id) AS count ",
    "FROM users u LEFT JOIN tasks t ON t.manager_id = u.id ",
    "WHERE u.role = 'manager' ",
    "GROUP BY u.id, u.full_name ORDER BY u.full_name",
);

const COMPLETED_PER_EMPLOYEE_SQL: &str = concat!(
    "SELECT u.full_name AS name, COUNT(t.id) AS count ",
    "FROM users u JOIN tasks t ON t.employee_id = u.id ",
    "WHERE u.role = 'employee' AND t.status = 'completed' ",
    "GROUP BY u.id, u.full_name ORDER BY u.full_name",
);

const TASKS_BY_STATUS_SQL: &str = "SELECT status, COUNT(*) AS count FROM tasks GROUP BY status";

/// Converts a persisted user row into the domain user.
fn row_to_user(row: UserRow) -> DirectoryRepositoryResult<User> {
    let role = Role::try_from(row.role.as_str()).map_err(DirectoryRepositoryError::persistence)?;
    let membership = Membership::from_parts(role, row.organization_id.map(OrganizationId::new))
        .map_err(DirectoryRepositoryError::persistence)?;
    let full_name = FullName::new(row.full_name).map_err(DirectoryRepositoryError::persistence)?;
    Ok(User::new(UserId::new(row.id), full_name, membership))
}

fn row_to_organization(row: OrganizationRow) -> DirectoryRepositoryResult<Organization> {
    let name = OrganizationName::new(row.name).map_err(DirectoryRepositoryError::persistence)?;
    Ok(Organization::new(OrganizationId::new(row.id), name))
}

fn membership_columns(membership: Membership) -> (&'static str, Option<i64>) {
    (
        membership.role().as_str(),
        membership.organization().map(OrganizationId::value),
    )
}

fn rows_to_users(rows: Vec<UserRow>) -> DirectoryRepositoryResult<Vec<User>> {
    rows.into_iter().map(row_to_user).collect()
}

fn named_counts(
    connection: &mut PgConnection,
    sql: &'static str,
) -> DirectoryRepositoryResult<Vec<NamedCount>> {
    diesel::sql_query(sql)
        .load::<NamedCountRow>(connection)?
        .into_iter()
        .map(|row| Ok(NamedCount::new(row.name, to_count(row.count)?)))
        .collect()
}

fn count_role(connection: &mut PgConnection, role: Role) -> DirectoryRepositoryResult<u64> {
    let count = users::table
        .filter(users::role.eq(role.as_str()))
        .count()
        .get_result::<i64>(connection)?;
    to_count(count)
}

fn status_counts(connection: &mut PgConnection) -> DirectoryRepositoryResult<Vec<StatusCount>> {
    let rows = diesel::sql_query(TASKS_BY_STATUS_SQL).load::<StatusCountRow>(connection)?;
    TaskStatus::ALL
        .into_iter()
        .map(|status| {
            let count = rows
                .iter()
                .find(|row| row.status == status.as_str())
                .map_or(0, |row| row.count);
            Ok(StatusCount {
                status,
                count: to_count(count)?,
            })
        })
        .collect()
}

#[async_trait]
impl DirectoryRepository for PostgresStore {
    async fn insert_user(&self, user: &User) -> DirectoryRepositoryResult<()> {
        let id = user.id();
        let (role, organization_id) = membership_columns(user.membership());
        let row = UserRow {
            id: id.value(),
            full_name: user.full_name().as_str().to_owned(),
            role: role.to_owned(),
            organization_id,
        };
        self.run_blocking(move |connection| {
            diesel::insert_into(users::table)
                .values(&row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        DirectoryRepositoryError::DuplicateUser(id)
                    }
                    DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                        DirectoryRepositoryError::OrganizationNotFound(OrganizationId::new(
                            organization_id.unwrap_or_default(),
                        ))
                    }
                    other => DirectoryRepositoryError::persistence(other),
                })?;
            Ok(())
        })
        .await
    }

    async fn find_user(&self, id: UserId) -> DirectoryRepositoryResult<Option<User>> {
        self.run_blocking(move |connection| {
            let row = users::table
                .find(id.value())
                .select(UserRow::as_select())
                .first::<UserRow>(connection)
                .optional()?;
            row.map(row_to_user).transpose()
        })
        .await
    }

    async fn list_users(&self) -> DirectoryRepositoryResult<Vec<User>> {
        self.run_blocking(|connection| {
            let rows = users::table
                .select(UserRow::as_select())
                .order(users::id)
                .load::<UserRow>(connection)?;
            rows_to_users(rows)
        })
        .await
    }

    async fn list_users_with_role(&self, role: Role) -> DirectoryRepositoryResult<Vec<User>> {
        self.run_blocking(move |connection| {
            let rows = users::table
                .filter(users::role.eq(role.as_str()))
                .select(UserRow::as_select())
                .order(users::id)
                .load::<UserRow>(connection)?;
            rows_to_users(rows)
        })
        .await
    }

    async fn list_members(
        &self,
        organization: OrganizationId,
        role: Role,
    ) -> DirectoryRepositoryResult<Vec<User>> {
        self.run_blocking(move |connection| {
            let rows = users::table
                .filter(users::organization_id.eq(organization.value()))
                .filter(users::role.eq(role.as_str()))
                .select(UserRow::as_select())
                .order(users::id)
                .load::<UserRow>(connection)?;
            rows_to_users(rows)
        })
        .await
    }

    async fn replace_membership(
        &self,
        id: UserId,
        expected: Membership,
        next: Membership,
    ) -> DirectoryRepositoryResult<User> {
        let (role, organization_id) = membership_columns(next);
        self.run_blocking(move |connection| {
            connection.transaction::<_, DirectoryRepositoryError, _>(|tx| {
                let current = users::table
                    .find(id.value())
                    .select(UserRow::as_select())
                    .for_update()
                    .get_result::<UserRow>(tx)
                    .optional()?
                    .ok_or(DirectoryRepositoryError::UserNotFound(id))?;
                if row_to_user(current)?.membership() != expected {
                    return Err(DirectoryRepositoryError::MembershipChanged(id));
                }

                let updated = diesel::update(users::table.find(id.value()))
                    .set((
                        users::role.eq(role),
                        users::organization_id.eq(organization_id),
                    ))
                    .returning(UserRow::as_returning())
                    .get_result::<UserRow>(tx)
                    .map_err(|err| match err {
                        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
                            DirectoryRepositoryError::OrganizationNotFound(OrganizationId::new(
                                organization_id.unwrap_or_default(),
                            ))
                        }
                        other => DirectoryRepositoryError::persistence(other),
                    })?;
                row_to_user(updated)
            })
        })
        .await
    }

    async fn insert_organization(
        &self,
        name: &OrganizationName,
    ) -> DirectoryRepositoryResult<Organization> {
        let owned = name.clone();
        self.run_blocking(move |connection| {
            let row = diesel::insert_into(organizations::table)
                .values(&NewOrganizationRow {
                    name: owned.as_str(),
                })
                .returning(OrganizationRow::as_returning())
                .get_result::<OrganizationRow>(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, ref info)
                        if info.constraint_name() == Some("organizations_name_key") =>
                    {
                        DirectoryRepositoryError::DuplicateOrganizationName(owned.clone())
                    }
                    other => DirectoryRepositoryError::persistence(other),
                })?;
            row_to_organization(row)
        })
        .await
    }

    async fn find_organization(
        &self,
        id: OrganizationId,
    ) -> DirectoryRepositoryResult<Option<Organization>> {
        self.run_blocking(move |connection| {
            let row = organizations::table
                .find(id.value())
                .select(OrganizationRow::as_select())
                .first::<OrganizationRow>(connection)
                .optional()?;
            row.map(row_to_organization).transpose()
        })
        .await
    }

    async fn list_organizations(&self) -> DirectoryRepositoryResult<Vec<Organization>> {
        self.run_blocking(|connection| {
            organizations::table
                .select(OrganizationRow::as_select())
                .order(organizations::id)
                .load::<OrganizationRow>(connection)?
                .into_iter()
                .map(row_to_organization)
                .collect()
        })
        .await
    }

    async fn delete_organization(
        &self,
        id: OrganizationId,
    ) -> DirectoryRepositoryResult<OrganizationRemoval> {
        self.run_blocking(move |connection| {
            connection.transaction::<_, DirectoryRepositoryError, _>(|tx| {
                let row = organizations::table
                    .find(id.value())
                    .select(OrganizationRow::as_select())
                    .for_update()
                    .get_result::<OrganizationRow>(tx)
                    .optional()?
                    .ok_or(DirectoryRepositoryError::OrganizationNotFound(id))?;

                let mut demoted = diesel::update(
                    users::table.filter(users::organization_id.eq(id.value())),
                )
                .set((
                    users::role.eq(Role::User.as_str()),
                    users::organization_id.eq(None::<i64>),
                ))
                .returning(users::id)
                .get_results::<i64>(tx)?;
                demoted.sort_unstable();

                let removed_tasks =
                    diesel::delete(tasks::table.filter(tasks::organization_id.eq(id.value())))
                        .execute(tx)?;
                diesel::delete(organizations::table.find(id.value())).execute(tx)?;

                Ok(OrganizationRemoval {
                    organization: row_to_organization(row)?,
                    demoted: demoted.into_iter().map(UserId::new).collect(),
                    removed_tasks: removed_tasks as u64,
                })
            })
        })
        .await
    }

    async fn reset(&self) -> DirectoryRepositoryResult<Vec<UserId>> {
        self.run_blocking(|connection| {
            connection.transaction::<_, DirectoryRepositoryError, _>(|tx| {
                diesel::delete(tasks::table).execute(tx)?;
                let mut removed = diesel::delete(
                    users::table.filter(users::role.ne(Role::Admin.as_str())),
                )
                .returning(users::id)
                .get_results::<i64>(tx)?;
                diesel::delete(organizations::table).execute(tx)?;
                removed.sort_unstable();
                Ok(removed.into_iter().map(UserId::new).collect())
            })
        })
        .await
    }

    async fn statistics(&self) -> DirectoryRepositoryResult<Statistics> {
        self.run_blocking(|connection| {
            connection.build_transaction().read_only().run::<_, DirectoryRepositoryError, _>(
                |tx| {
                    let total_users = users::table.count().get_result::<i64>(tx)?;
                    let total_organizations = organizations::table.count().get_result::<i64>(tx)?;
                    let total_tasks = tasks::table.count().get_result::<i64>(tx)?;
                    Ok(Statistics {
                        total_users: to_count(total_users)?,
                        total_organizations: to_count(total_organizations)?,
                        total_tasks: to_count(total_tasks)?,
                        tasks_by_status: status_counts(tx)?,
                        managers: count_role(tx, Role::Manager)?,
                        employees: count_role(tx, Role::Employee)?,
                        tasks_per_organization: named_counts(tx, TASKS_PER_ORGANIZATION_SQL)?,
                        tasks_per_manager: named_counts(tx, TASKS_PER_MANAGER_SQL)?,
                        completed_per_employee: named_counts(tx, COMPLETED_PER_EMPLOYEE_SQL)?,
                    })
                },
            )
        })
        .await
    }
}
