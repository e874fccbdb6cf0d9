//! Watcher engine: status fetching, chat delivery and the cycle scheduler.
mod commands;
mod fetch;
mod scheduler;
mod telegram;

pub use commands::{ChatCommand, CommandListener, ControlCommand, ListenerSettings};
pub use fetch::{FetchSettings, ReqwestStatusFetcher, StatusFetcher, DEFAULT_ENDPOINT};
pub use scheduler::{Clock, Scheduler, SchedulerSettings};
pub use telegram::{
    Notifier, ReplyKeyboard, TelegramBot, TelegramError, TelegramSettings, Update,
    DEFAULT_TELEGRAM_API,
};
