//! Diesel row models for the bot tables.

use super::schema::{organizations, tasks, users};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text, Timestamptz, Varchar};

/// Query result row for organizations.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct OrganizationRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Organization name.
    pub name: String,
}

/// Insert model for organizations.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = organizations)]
pub struct NewOrganizationRow<'a> {
    /// Organization name.
    pub name: &'a str,
}

/// Query result row and insert model for users.
#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    /// Chat platform user id.
    pub id: i64,
    /// Display name.
    pub full_name: String,
    /// Role name.
    pub role: String,
    /// Organization for employees and managers.
    pub organization_id: Option<i64>,
}

/// Query result row for tasks.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = tasks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TaskRow {
    /// Store-assigned identifier.
    pub id: i64,
    /// Task title.
    pub title: String,
    /// Task description.
    pub description: String,
    /// Assigned employee.
    pub employee_id: i64,
    /// Manager who handed out the task.
    pub manager_id: i64,
    /// Organization.
    pub organization_id: i64,
    /// Lifecycle status.
    pub status: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Insert model for tasks.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = tasks)]
pub struct NewTaskRow<'a> {
    /// Task title.
    pub title: &'a str,
    /// Task description.
    pub description: &'a str,
    /// Assigned employee.
    pub employee_id: i64,
    /// Manager who handed out the task.
    pub manager_id: i64,
    /// Organization.
    pub organization_id: i64,
    /// Lifecycle status.
    pub status: &'a str,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Name and count produced by grouped statistics queries.
#[derive(Debug, Clone, QueryableByName)]
pub struct NamedCountRow {
    /// Group label.
    #[diesel(sql_type = Varchar)]
    pub name: String,
    /// Number of rows in the group.
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

/// Status and count produced by the per-status statistics query.
#[derive(Debug, Clone, QueryableByName)]
pub struct StatusCountRow {
    /// Task status.
    #[diesel(sql_type = Text)]
    pub status: String,
    /// Number of tasks in that status.
    #[diesel(sql_type = BigInt)]
    pub count: i64,
}

/// Task joined with the names of its manager and employee.
#[derive(Debug, Clone, QueryableByName)]
pub struct TaskDetailsRow {
    /// Store-assigned identifier.
    #[diesel(sql_type = BigInt)]
    pub id: i64,
    /// Task title.
    #[diesel(sql_type = Varchar)]
    pub title: String,
    /// Task description.
    #[diesel(sql_type = Text)]
    pub description: String,
    /// Assigned employee.
    #[diesel(sql_type = BigInt)]
    pub employee_id: i64,
    /// Manager who handed out the task.
    #[diesel(sql_type = BigInt)]
    pub manager_id: i64,
    /// Organization.
    #[diesel(sql_type = BigInt)]
    pub organization_id: i64,
    /// Lifecycle status.
    #[diesel(sql_type = Varchar)]
    pub status: String,
    /// Creation timestamp.
    #[diesel(sql_type = Timestamptz)]
    pub created_at: DateTime<Utc>,
    /// Manager display name.
    #[diesel(sql_type = Varchar)]
    pub manager_name: String,
    /// Employee display name.
    #[diesel(sql_type = Varchar)]
    pub employee_name: String,
}
