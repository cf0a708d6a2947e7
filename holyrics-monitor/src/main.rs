use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod printer;

use holyrics_client::ConnectionConfig;
use holyrics_state::logging::{init_logging_with_filter, LoggingMode};
use holyrics_state::{Coordinator, EngineConfig};
use printer::ChangePrinter;

/// Holyrics state monitor
///
/// Connects to a Holyrics remote API, loads the Bible version list, and
/// prints every variable change published by the poller.
#[derive(Parser, Debug)]
#[command(name = "holyrics-monitor")]
#[command(about = "Poll a Holyrics controller and print state changes")]
#[command(version)]
pub struct Args {
    /// Controller IP address
    #[arg(long, env = "HOLYRICS_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Remote API port
    #[arg(short, long, env = "HOLYRICS_PORT", default_value = "8091")]
    pub port: u16,

    /// API access token
    #[arg(short, long, env = "HOLYRICS_TOKEN", default_value = "", hide_env_values = true)]
    pub token: String,

    /// Poll interval in milliseconds
    #[arg(long, env = "HOLYRICS_POLL_MS", default_value = "1000")]
    pub poll_ms: u64,

    /// Print every tick, not only ticks that changed something
    #[arg(long)]
    pub all_ticks: bool,

    /// Print the whole snapshot as JSON instead of changed variables
    #[arg(long)]
    pub json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, env = "HOLYRICS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    pub fn validate(&self) -> Result<()> {
        if self.poll_ms == 0 {
            return Err(anyhow::anyhow!("Poll interval must be positive"));
        }

        match self.log_level.to_lowercase().as_str() {
            "error" | "warn" | "info" | "debug" | "trace" => {}
            _ => {
                return Err(anyhow::anyhow!(
                    "Invalid log level '{}'. Valid levels: error, warn, info, debug, trace",
                    self.log_level
                ));
            }
        }

        Ok(())
    }

    pub fn connection(&self) -> ConnectionConfig {
        ConnectionConfig::new(self.host.clone(), self.port, self.token.clone())
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig::new().with_poll_interval(Duration::from_millis(self.poll_ms))
    }
}

async fn run(args: Args) -> Result<()> {
    let coordinator = Coordinator::new(args.engine_config())
        .context("Failed to create coordinator")?;

    coordinator.add_consumer(Arc::new(ChangePrinter::new(args.all_ticks, args.json)));

    info!(host = %args.host, port = args.port, "Connecting to controller");
    coordinator
        .configure(args.connection())
        .await
        .context("Failed to configure controller connection")?;

    let versions = coordinator.bible_versions();
    info!("Controller offers {} Bible version(s)", versions.len());
    for version in &versions {
        info!("  {} ({})", version.label, version.id);
    }

    info!("Polling; press Ctrl+C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutting down...");
    let stats = coordinator.engine().stats();
    if let Err(e) = coordinator.destroy().await {
        warn!("Failed to stop poller cleanly: {}", e);
    }

    info!(
        "Ran {} tick(s), {} failed call(s)",
        stats.tick_count, stats.failed_calls
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    args.validate()?;
    init_logging_with_filter(LoggingMode::for_level(&args.log_level), &args.log_level)
        .context("Failed to initialize logging")?;

    run(args).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn parse(extra: &[&str]) -> Args {
        let mut argv = vec!["holyrics-monitor"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn test_args_build_connection() {
        let args = parse(&["--host", "10.1.1.4", "--port", "9000", "--token", "abc"]);
        assert!(args.validate().is_ok());

        let connection = args.connection();
        assert_eq!(connection, ConnectionConfig::new("10.1.1.4", 9000, "abc"));
        assert_eq!(args.engine_config().poll_interval, Duration::from_millis(1000));
    }

    #[rstest]
    #[case(&["--poll-ms", "0"])]
    #[case(&["--log-level", "loud"])]
    fn test_invalid_args_rejected(#[case] extra: &[&str]) {
        assert!(parse(extra).validate().is_err());
    }
}
