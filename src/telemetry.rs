//! Process-wide `tracing` setup.
//!
//! Events go to stderr through an [`EnvFilter`]. When a log directory is
//! configured, two daily-rolling files are written as well: `taskbot.log`
//! with everything that passes the filter, and `user_actions.log` with the
//! audit trail only.

use crate::config::LogConfig;
use thiserror::Error;
use tracing_appender::{non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::{Directive, ParseError, filter_fn},
    fmt,
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
};

/// Target of the one-line-per-action audit events.
pub const AUDIT_TARGET: &str = "user_actions";

/// Errors raised while installing the subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured filter directive does not parse.
    #[error("invalid log filter `{filter}`: {source}")]
    Filter {
        /// Offending directive string.
        filter: String,
        /// Parser diagnostic.
        source: ParseError,
    },

    /// A global subscriber was already installed.
    #[error("failed to install the tracing subscriber: {0}")]
    Install(#[from] TryInitError),
}

/// Keeps the background file writers alive.
///
/// Buffered lines are flushed when the value is dropped, so hold it for the
/// lifetime of the process.
#[must_use = "dropping the guards stops the file writers"]
pub struct LogGuards {
    _writers: Vec<WorkerGuard>,
}

/// Installs the global subscriber described by `config`.
///
/// `RUST_LOG`, when set and valid, takes precedence over `config.filter`.
/// Audit events are always enabled at `info`.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the configured filter is invalid
/// and [`TelemetryError::Install`] when a subscriber is already set.
pub fn init(config: &LogConfig) -> Result<LogGuards, TelemetryError> {
    let invalid = |source| TelemetryError::Filter {
        filter: config.filter.clone(),
        source,
    };
    let audit_directive = format!("{AUDIT_TARGET}=info")
        .parse::<Directive>()
        .map_err(invalid)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(invalid)?
        .add_directive(audit_directive);

    let mut writers = Vec::new();
    let files = config.directory.as_deref().map(|directory| {
        let (everything, everything_guard) =
            tracing_appender::non_blocking(rolling::daily(directory, "taskbot.log"));
        let (audit, audit_guard) =
            tracing_appender::non_blocking(rolling::daily(directory, "user_actions.log"));
        writers.push(everything_guard);
        writers.push(audit_guard);

        fmt::layer()
            .with_ansi(false)
            .with_writer(everything)
            .and_then(
                fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(audit)
                    .with_filter(filter_fn(|metadata| metadata.target() == AUDIT_TARGET)),
            )
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(files)
        .try_init()?;

    Ok(LogGuards { _writers: writers })
}
