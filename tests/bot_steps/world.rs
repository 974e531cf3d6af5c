//! Shared world state for bot behaviour scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use taskbot::conversation::{
    adapters::memory::InMemoryFlowStore, domain::Inbound, services::FlowController,
};
use taskbot::directory::{
    domain::{OrganizationId, UserId},
    services::RegistryService,
};
use taskbot::notification::{
    adapters::memory::RecordingNotifier, domain::OutboundMessage,
    services::NotificationDispatcher,
};
use taskbot::storage::memory::InMemoryStore;
use taskbot::task::{
    domain::{OrphanPolicy, TaskId},
    services::TaskLifecycleService,
};

pub const ADMIN: UserId = UserId::new(1);
pub const MANAGER: UserId = UserId::new(2);
pub const EMPLOYEE: UserId = UserId::new(3);
pub const OUTSIDER: UserId = UserId::new(4);

/// Controller type driven by the scenarios.
pub type TestBot = FlowController<InMemoryStore, InMemoryFlowStore, RecordingNotifier, DefaultClock>;

/// Scenario world for bot behaviour tests.
pub struct BotWorld {
    pub bot: TestBot,
    pub registry: RegistryService<InMemoryStore>,
    pub tasks: TaskLifecycleService<InMemoryStore, InMemoryStore, DefaultClock>,
    pub notifier: RecordingNotifier,
    pub organization: Option<OrganizationId>,
    pub task: Option<TaskId>,
    pub last_replies: Vec<OutboundMessage>,
}

impl BotWorld {
    /// Creates a world over an empty store.
    ///
    /// # Errors
    ///
    /// Returns an error if the message templates fail to load.
    pub fn new() -> Result<Self, eyre::Report> {
        let store = Arc::new(InMemoryStore::new());
        let notifier = RecordingNotifier::new();
        let tasks = || {
            TaskLifecycleService::new(
                Arc::clone(&store),
                Arc::clone(&store),
                Arc::new(DefaultClock),
                OrphanPolicy::Retain,
            )
        };
        let bot = FlowController::new(
            RegistryService::new(Arc::clone(&store), ADMIN),
            tasks(),
            Arc::new(InMemoryFlowStore::new()),
            NotificationDispatcher::new(Arc::new(notifier.clone())),
        )?;
        Ok(Self {
            bot,
            registry: RegistryService::new(Arc::clone(&store), ADMIN),
            tasks: tasks(),
            notifier,
            organization: None,
            task: None,
            last_replies: Vec::new(),
        })
    }

    /// Sends `inbound` as `user` and keeps the replies.
    pub fn handle(&mut self, user: UserId, inbound: Inbound) {
        self.last_replies = run_async(self.bot.handle(user, inbound));
    }

    /// Returns the task created in the background steps.
    ///
    /// # Errors
    ///
    /// Returns an error if no task was handed out yet.
    pub fn task(&self) -> Result<TaskId, eyre::Report> {
        self.task
            .ok_or_else(|| eyre::eyre!("missing task in scenario world"))
    }
}

/// Fixture that creates a new scenario world.
///
/// # Panics
///
/// Panics if the bundled message templates fail to load.
#[fixture]
pub fn world() -> BotWorld {
    match BotWorld::new() {
        Ok(world) => world,
        Err(err) => panic!("failed to build scenario world: {err}"),
    }
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}

/// Maps a role keyword from a scenario to its user.
///
/// # Errors
///
/// Returns an error for unknown keywords.
pub fn actor(name: &str) -> Result<UserId, eyre::Report> {
    match name {
        "admin" => Ok(ADMIN),
        "manager" => Ok(MANAGER),
        "employee" => Ok(EMPLOYEE),
        "outsider" => Ok(OUTSIDER),
        other => Err(eyre::eyre!("unknown actor in scenario: {other}")),
    }
}
