//! Runtime configuration.
//!
//! Values are layered: built-in defaults, then the optional
//! `config/taskbot.{toml,yaml,json}` file, then `TASKBOT_` environment
//! variables with `__` between nested keys (`TASKBOT_DATABASE__HOST`).

use crate::directory::domain::UserId;
use crate::task::domain::OrphanPolicy;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

const DEFAULT_CONFIG_FILE: &str = "config/taskbot";

/// Errors raised while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or a value failed to deserialize.
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A value deserialized but is unusable.
    #[error("invalid configuration value for `{key}`: {reason}")]
    Invalid {
        /// Dotted key of the offending value.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}

/// Bot process configuration.
#[derive(Clone, Deserialize)]
pub struct BotConfig {
    /// Telegram bot API token.
    pub bot_token: String,
    /// Telegram user id of the single administrator.
    pub admin_id: i64,
    /// Relational store settings.
    pub database: DatabaseConfig,
    /// Handling of tasks whose manager or employee lost their role.
    #[serde(default)]
    pub orphan_policy: OrphanPolicy,
    /// Logging settings.
    #[serde(default)]
    pub log: LogConfig,
}

impl BotConfig {
    /// Loads the configuration from the default file location and the
    /// environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or a value is
    /// malformed.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    /// Loads the configuration using `file` (without extension) as the
    /// optional file source.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a required key is missing or a value is
    /// malformed.
    pub fn load_from(file: &str) -> Result<Self, ConfigError> {
        let loaded: Self = Config::builder()
            .set_default("database.port", i64::from(DatabaseConfig::DEFAULT_PORT))?
            .set_default("database.pool_size", i64::from(DatabaseConfig::DEFAULT_POOL_SIZE))?
            .add_source(File::with_name(file).required(false))
            .add_source(
                Environment::with_prefix("TASKBOT")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Returns the administrator identity.
    #[must_use]
    pub const fn admin(&self) -> UserId {
        UserId::new(self.admin_id)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.bot_token.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "bot_token",
                reason: "must not be empty".to_owned(),
            });
        }
        if self.admin_id <= 0 {
            return Err(ConfigError::Invalid {
                key: "admin_id",
                reason: format!("{} is not a Telegram user id", self.admin_id),
            });
        }
        if self.database.pool_size == 0 {
            return Err(ConfigError::Invalid {
                key: "database.pool_size",
                reason: "must be at least 1".to_owned(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("admin_id", &self.admin_id)
            .field("database", &self.database)
            .field("orphan_policy", &self.orphan_policy)
            .field("log", &self.log)
            .finish()
    }
}

/// PostgreSQL connection settings.
#[derive(Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Server host name.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Database name.
    pub name: String,
    /// Login role.
    pub user: String,
    /// Login password.
    pub password: String,
    /// Maximum number of pooled connections.
    pub pool_size: u32,
}

impl DatabaseConfig {
    const DEFAULT_PORT: u16 = 5432;
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Returns the libpq keyword/value connection string.
    ///
    /// Every value is quoted, so credentials may contain any character.
    #[must_use]
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={}",
            quote_libpq(&self.host),
            self.port,
            quote_libpq(&self.name),
            quote_libpq(&self.user),
            quote_libpq(&self.password),
        )
    }
}

/// Single-quotes `value` with backslashes and quotes escaped.
fn quote_libpq(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('\'');
    for ch in value.chars() {
        if matches!(ch, '\'' | '\\') {
            quoted.push('\\');
        }
        quoted.push(ch);
    }
    quoted.push('\'');
    quoted
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("pool_size", &self.pool_size)
            .finish()
    }
}

/// Logging settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// `EnvFilter` directives used when `RUST_LOG` is unset.
    pub filter: String,
    /// Directory for the rolling log files; stderr only when unset.
    pub directory: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: "taskbot=info".to_owned(),
            directory: None,
        }
    }
}
