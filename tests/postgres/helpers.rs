//! Shared helpers for `PostgreSQL` integration tests.

use std::sync::Arc;

use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use taskbot::directory::{
    domain::{OrganizationId, Role, UserId},
    services::{AssignRoleRequest, RegistryService},
};
use taskbot::storage::postgres::PostgresStore;
use taskbot::task::{domain::OrphanPolicy, services::TaskLifecycleService};
use tokio::sync::{Mutex, MutexGuard};

/// Environment variable naming the disposable test database.
pub const DATABASE_URL_VAR: &str = "TASKBOT_TEST_DATABASE_URL";

pub const ADMIN: UserId = UserId::new(7_000_001);
pub const MANAGER: UserId = UserId::new(7_000_002);
pub const EMPLOYEE: UserId = UserId::new(7_000_003);
pub const NEWCOMER: UserId = UserId::new(7_000_004);

/// Tests share one database, so they run one at a time.
static DATABASE: Mutex<()> = Mutex::const_new(());

/// Task service over the `PostgreSQL` store.
pub type PgTasks = TaskLifecycleService<PostgresStore, PostgresStore, DefaultClock>;

/// Store and services over an emptied database, holding the database lock.
pub struct PgOffice {
    pub store: Arc<PostgresStore>,
    pub registry: RegistryService<PostgresStore>,
    pub tasks: PgTasks,
    _lock: MutexGuard<'static, ()>,
}

impl PgOffice {
    /// Registers the cast, creates "Acme" and staffs it.
    ///
    /// # Errors
    ///
    /// Returns an error if any setup call is refused.
    pub async fn staff(&self) -> eyre::Result<OrganizationId> {
        self.registry.register(ADMIN, "Ada Admin").await?;
        self.registry.register(MANAGER, "Mona Manager").await?;
        self.registry.register(EMPLOYEE, "Eve Employee").await?;
        self.registry.register(NEWCOMER, "Nils Newcomer").await?;
        let organization = self.registry.create_organization(ADMIN, "Acme").await?.id();
        self.registry
            .assign_role(
                AssignRoleRequest::new(ADMIN, MANAGER, Role::Manager)
                    .with_organization(organization),
            )
            .await?;
        self.registry
            .assign_role(AssignRoleRequest::new(MANAGER, EMPLOYEE, Role::Employee))
            .await?;
        Ok(organization)
    }
}

/// Connects to the test database, applies the schema and empties it.
///
/// Returns `None` when [`DATABASE_URL_VAR`] is unset.
///
/// # Errors
///
/// Returns an error if the database is unreachable or the schema fails.
pub async fn office(policy: OrphanPolicy) -> eyre::Result<Option<PgOffice>> {
    let Ok(url) = std::env::var(DATABASE_URL_VAR) else {
        return Ok(None);
    };
    let lock = DATABASE.lock().await;
    let pool = Pool::builder()
        .max_size(4)
        .build(ConnectionManager::<PgConnection>::new(url))?;
    let store = Arc::new(PostgresStore::new(pool));
    store.bootstrap_schema().await?;
    let cleaner = store.pool().clone();
    tokio::task::spawn_blocking(move || -> eyre::Result<()> {
        let mut connection = cleaner.get()?;
        connection.batch_execute("TRUNCATE tasks, users, organizations RESTART IDENTITY CASCADE")?;
        Ok(())
    })
    .await??;

    Ok(Some(PgOffice {
        registry: RegistryService::new(Arc::clone(&store), ADMIN),
        tasks: TaskLifecycleService::new(
            Arc::clone(&store),
            Arc::clone(&store),
            Arc::new(DefaultClock),
            policy,
        ),
        store,
        _lock: lock,
    }))
}
