use std::time::Duration;

use clap::{Parser, ValueEnum};
use log::LevelFilter;
use watch_logging::LogDestination;
use watcher_engine::{
    FetchSettings, SchedulerSettings, TelegramSettings, DEFAULT_ENDPOINT, DEFAULT_TELEGRAM_API,
};

/// Watches homework review statuses and forwards changes to a Telegram chat.
#[derive(Parser, Debug, Clone)]
#[command(name = "homework_watcher", version)]
pub struct Config {
    /// Token for the homework status API
    #[arg(long, env = "PRACTICUM_TOKEN", hide_env_values = true, value_parser = non_empty)]
    pub practicum_token: String,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", hide_env_values = true, value_parser = non_empty)]
    pub telegram_token: String,

    /// Chat that receives notifications and may send commands
    #[arg(long, env = "TELEGRAM_CHAT_ID", value_parser = non_empty)]
    pub telegram_chat_id: String,

    /// Seconds between polls
    #[arg(long, env = "WATCH_INTERVAL_SECS", default_value_t = 600, value_parser = clap::value_parser!(u64).range(1..))]
    pub interval_secs: u64,

    /// How far before startup the first poll looks, in seconds
    #[arg(long, env = "WATCH_LOOKBACK_SECS", default_value_t = 600)]
    pub lookback_secs: u64,

    #[arg(long, env = "PRACTICUM_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,

    #[arg(long, env = "TELEGRAM_API_URL", default_value = DEFAULT_TELEGRAM_API)]
    pub telegram_api_url: String,

    /// Do not listen for /start and /clear_error_cache
    #[arg(long, env = "WATCH_NO_COMMANDS")]
    pub no_commands: bool,

    #[arg(long, value_enum, default_value_t, env = "WATCH_LOG")]
    pub log: LogTarget,

    #[arg(long, env = "WATCH_LOG_LEVEL", default_value_t = LevelFilter::Info)]
    pub log_level: LevelFilter,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogTarget {
    #[default]
    Terminal,
    File,
    Both,
}

impl From<LogTarget> for LogDestination {
    fn from(target: LogTarget) -> Self {
        match target {
            LogTarget::Terminal => LogDestination::Terminal,
            LogTarget::File => LogDestination::File,
            LogTarget::Both => LogDestination::Both,
        }
    }
}

fn non_empty(value: &str) -> Result<String, String> {
    let value = value.trim();
    if value.is_empty() {
        Err("must not be empty".to_string())
    } else {
        Ok(value.to_string())
    }
}

impl Config {
    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            endpoint: self.endpoint.clone(),
            token: self.practicum_token.clone(),
            ..FetchSettings::default()
        }
    }

    pub fn telegram_settings(&self) -> TelegramSettings {
        TelegramSettings {
            api_url: self.telegram_api_url.clone(),
            bot_token: self.telegram_token.clone(),
            chat_id: self.telegram_chat_id.clone(),
            ..TelegramSettings::default()
        }
    }

    pub fn scheduler_settings(&self) -> SchedulerSettings {
        SchedulerSettings {
            interval: Duration::from_secs(self.interval_secs),
        }
    }

    pub fn lookback(&self) -> i64 {
        i64::try_from(self.lookback_secs).unwrap_or(i64::MAX)
    }
}
