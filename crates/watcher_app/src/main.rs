mod app;
mod config;

use clap::Parser;
use log::LevelFilter;
use watch_logging::{watch_error, LogDestination};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::try_parse().unwrap_or_else(|err| {
        // Missing secrets stop the process before any cycle runs.
        if err.use_stderr() {
            watch_logging::initialize(LogDestination::Terminal, LevelFilter::Error);
            watch_error!("Invalid configuration: {}", err.kind());
        }
        err.exit()
    });
    watch_logging::initialize(config.log.into(), config.log_level);
    app::run_app(config).await
}
