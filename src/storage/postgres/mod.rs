//! `PostgreSQL` store implementing the directory and task ports with Diesel.
//!
//! All database operations are offloaded to a blocking thread pool via
//! [`tokio::task::spawn_blocking`]. Read-check-write sequences run inside a
//! single transaction with the affected rows locked.

mod directory;
mod models;
mod schema;
mod tasks;

use crate::directory::ports::DirectoryRepositoryError;
use crate::task::ports::TaskRepositoryError;
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PoolError};
use diesel::result::Error as DieselError;
use thiserror::Error;

/// `PostgreSQL` connection pool type.
pub type PgPool = Pool<ConnectionManager<PgConnection>>;

/// Idempotent DDL creating the bot tables.
pub const SCHEMA_SQL: &str =
    include_str!("../../../migrations/2026-10-01-000000_create_bot_tables/up.sql");

/// Infrastructure failure outside a query.
#[derive(Debug, Error)]
pub enum StoreFailure {
    /// No pooled connection was available.
    #[error("connection pool error: {0}")]
    Pool(#[from] PoolError),
    /// The blocking task panicked or was cancelled.
    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
    /// Schema bootstrap failed.
    #[error("schema bootstrap failed: {0}")]
    Schema(#[source] DieselError),
}

impl From<StoreFailure> for DirectoryRepositoryError {
    fn from(err: StoreFailure) -> Self {
        Self::persistence(err)
    }
}

impl From<StoreFailure> for TaskRepositoryError {
    fn from(err: StoreFailure) -> Self {
        Self::persistence(err)
    }
}

impl From<DieselError> for DirectoryRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

impl From<DieselError> for TaskRepositoryError {
    fn from(err: DieselError) -> Self {
        Self::persistence(err)
    }
}

/// `PostgreSQL`-backed store.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store from a connection pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Creates the bot tables if they do not exist.
    ///
    /// # Errors
    ///
    /// Returns [`StoreFailure`] when no connection is available or the DDL
    /// fails.
    pub async fn bootstrap_schema(&self) -> Result<(), StoreFailure> {
        self.run_blocking(|connection| {
            connection
                .batch_execute(SCHEMA_SQL)
                .map_err(StoreFailure::Schema)
        })
        .await
    }

    async fn run_blocking<F, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut PgConnection) -> Result<T, E> + Send + 'static,
        T: Send + 'static,
        E: From<StoreFailure> + Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(StoreFailure::from)?;
            f(&mut connection)
        })
        .await
        .map_err(StoreFailure::from)?
    }
}

fn to_count(value: i64) -> Result<u64, DirectoryRepositoryError> {
    u64::try_from(value).map_err(DirectoryRepositoryError::persistence)
}
