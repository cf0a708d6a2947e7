//! Logging setup for applications embedding the poller
//!
//! The library itself only emits `tracing` events; call one of these early
//! to route them to stderr. Stdout stays free for whatever the application
//! prints about the published state.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

/// How much detail log lines carry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoggingMode {
    /// No subscriber installed
    Silent,
    /// Compact one-line events
    Development,
    /// Multi-line events with thread ids and source locations
    Debug,
}

impl LoggingMode {
    /// Mode matching a level directive: `debug`/`trace` get source locations
    pub fn for_level(level: &str) -> Self {
        match level.trim().to_lowercase().as_str() {
            "debug" | "trace" => LoggingMode::Debug,
            _ => LoggingMode::Development,
        }
    }

    fn default_level(self) -> &'static str {
        match self {
            LoggingMode::Debug => "debug",
            _ => "info",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracingInit(String),
}

/// Install a subscriber for `mode`, filtered by the environment
///
/// `HOLYRICS_LOG_LEVEL` wins over `RUST_LOG`; with neither set the mode's
/// own default level applies.
pub fn init_logging(mode: LoggingMode) -> Result<(), LoggingError> {
    install(mode, env_filter(mode.default_level()))
}

/// Install a subscriber for `mode` with an explicit filter directive
///
/// `RUST_LOG` still overrides `directive` when set, so per-target
/// filtering stays available.
pub fn init_logging_with_filter(mode: LoggingMode, directive: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));
    install(mode, filter)
}

/// Pick the mode from `HOLYRICS_LOG_MODE` (`development`, `debug`), silent otherwise
pub fn init_logging_from_env() -> Result<(), LoggingError> {
    let mode = mode_from_env(std::env::var("HOLYRICS_LOG_MODE").ok().as_deref());
    init_logging(mode)
}

fn install(mode: LoggingMode, filter: EnvFilter) -> Result<(), LoggingError> {
    let result = match mode {
        LoggingMode::Silent => return Ok(()),
        LoggingMode::Development => Registry::default()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false)
                    .compact(),
            )
            .with(filter)
            .try_init(),
        LoggingMode::Debug => Registry::default()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .pretty()
                    .with_thread_ids(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .with(filter)
            .try_init(),
    };

    result.map_err(|e| LoggingError::TracingInit(e.to_string()))
}

fn mode_from_env(value: Option<&str>) -> LoggingMode {
    match value {
        Some("development") => LoggingMode::Development,
        Some("debug") => LoggingMode::Debug,
        _ => LoggingMode::Silent,
    }
}

fn env_filter(default_level: &str) -> EnvFilter {
    if let Ok(level) = std::env::var("HOLYRICS_LOG_LEVEL") {
        EnvFilter::new(level)
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
    }
}

pub fn is_initialized() -> bool {
    tracing::dispatcher::has_been_set()
}
