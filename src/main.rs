//! `taskbot` binary: loads configuration, prepares the store and runs the
//! Telegram update loop.

use anyhow::{Context, Result};
use diesel::pg::PgConnection;
use diesel::r2d2::{ConnectionManager, Pool};
use mockable::DefaultClock;
use std::sync::Arc;
use taskbot::config::BotConfig;
use taskbot::conversation::{adapters::memory::InMemoryFlowStore, services::FlowController};
use taskbot::directory::services::RegistryService;
use taskbot::notification::services::NotificationDispatcher;
use taskbot::storage::postgres::PostgresStore;
use taskbot::task::services::TaskLifecycleService;
use taskbot::telegram::{self, TelegramNotifier};
use taskbot::telemetry;
use teloxide::Bot;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let env_file = dotenvy::dotenv().ok();
    let config = BotConfig::load().context("failed to load configuration")?;
    let _log_guards = telemetry::init(&config.log).context("failed to initialize logging")?;
    if let Some(path) = env_file {
        debug!(path = %path.display(), "loaded environment file");
    }
    info!(
        admin = %config.admin(),
        orphan_policy = %config.orphan_policy,
        "starting taskbot"
    );

    let manager = ConnectionManager::<PgConnection>::new(config.database.connection_string());
    let pool = Pool::builder()
        .max_size(config.database.pool_size)
        .build(manager)
        .context("failed to connect to PostgreSQL")?;
    let store = Arc::new(PostgresStore::new(pool));
    store
        .bootstrap_schema()
        .await
        .context("failed to create the database schema")?;

    let bot = Bot::new(config.bot_token.clone());
    let dispatcher = NotificationDispatcher::new(Arc::new(TelegramNotifier::new(bot.clone())));
    let registry = RegistryService::new(Arc::clone(&store), config.admin());
    let tasks = TaskLifecycleService::new(
        Arc::clone(&store),
        Arc::clone(&store),
        Arc::new(DefaultClock),
        config.orphan_policy,
    );
    let controller = FlowController::new(
        registry,
        tasks,
        Arc::new(InMemoryFlowStore::new()),
        dispatcher.clone(),
    )
    .context("failed to load message templates")?;

    telegram::run(bot, Arc::new(controller), dispatcher).await;
    Ok(())
}
