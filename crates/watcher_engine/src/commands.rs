use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_debug, watch_info, watch_warn};
use watcher_core::WatchSnapshot;

use crate::telegram::{ReplyKeyboard, TelegramBot, TelegramError};

/// Requests the scheduler applies to its own state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    ClearErrorCache,
}

/// Commands recognised in chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    ClearErrorCache,
}

impl ChatCommand {
    /// Parse `/start`, `/start@my_bot`, `/clear_error_cache extra words`, ...
    pub fn parse(text: &str) -> Option<Self> {
        let word = text.split_whitespace().next()?;
        let name = word.strip_prefix('/')?;
        let name = name.split('@').next().unwrap_or(name);
        match name {
            "start" => Some(ChatCommand::Start),
            "clear_error_cache" => Some(ChatCommand::ClearErrorCache),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ListenerSettings {
    /// Long-poll window passed to `getUpdates`.
    pub poll_timeout: Duration,
    /// Pause after a failed poll.
    pub retry_delay: Duration,
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            poll_timeout: Duration::from_secs(30),
            retry_delay: Duration::from_secs(5),
        }
    }
}

/// Answers chat commands. Never touches scheduler state directly: cache
/// changes go through the command channel, status comes from the snapshot.
pub struct CommandListener {
    bot: Arc<TelegramBot>,
    commands: mpsc::UnboundedSender<ControlCommand>,
    snapshot: watch::Receiver<WatchSnapshot>,
    settings: ListenerSettings,
    offset: Option<i64>,
}

impl CommandListener {
    pub fn new(
        bot: Arc<TelegramBot>,
        commands: mpsc::UnboundedSender<ControlCommand>,
        snapshot: watch::Receiver<WatchSnapshot>,
        settings: ListenerSettings,
    ) -> Self {
        Self {
            bot,
            commands,
            snapshot,
            settings,
            offset: None,
        }
    }

    pub async fn run(mut self, cancel: CancellationToken) {
        watch_info!("Listening for chat commands");
        loop {
            let polled = tokio::select! {
                _ = cancel.cancelled() => break,
                polled = self.poll_once() => polled,
            };
            if let Err(err) = polled {
                watch_warn!("Polling chat commands failed: {}", err);
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(self.settings.retry_delay) => {}
                }
            }
        }
        watch_info!("Command listener stopped");
    }

    /// Fetch one batch of updates and answer the commands in it.
    /// Returns how many commands were handled.
    pub async fn poll_once(&mut self) -> Result<usize, TelegramError> {
        let updates = self
            .bot
            .get_updates(self.offset, self.settings.poll_timeout.as_secs())
            .await?;

        let mut handled = 0;
        for update in updates {
            self.offset = Some(update.update_id + 1);
            let Some(message) = update.message else {
                continue;
            };
            let chat_id = message.chat.id.to_string();
            let Some(command) = message.text.as_deref().and_then(ChatCommand::parse) else {
                continue;
            };
            if chat_id != self.bot.chat_id() {
                watch_debug!("Ignoring {:?} from chat {}", command, chat_id);
                continue;
            }
            self.handle(&chat_id, command).await?;
            handled += 1;
        }
        Ok(handled)
    }

    async fn handle(&self, chat_id: &str, command: ChatCommand) -> Result<(), TelegramError> {
        let reply = match command {
            ChatCommand::Start => {
                watch_info!("Answering /start");
                let snapshot = self.snapshot.borrow().clone();
                awake_message(&snapshot)
            }
            ChatCommand::ClearErrorCache => {
                if self.commands.send(ControlCommand::ClearErrorCache).is_err() {
                    watch_warn!("Scheduler is gone; error cache not cleared");
                    "Watcher is not running".to_string()
                } else {
                    watch_info!("Requested error cache clear");
                    "Error cache cleared".to_string()
                }
            }
        };
        let keyboard = ReplyKeyboard::single_row(["/start", "/clear_error_cache"]);
        self.bot.send_message(chat_id, &reply, Some(&keyboard)).await
    }
}

fn awake_message(snapshot: &WatchSnapshot) -> String {
    let mut text = format!(
        "I'm awake. Cycles run: {}, checking updates since {}.",
        snapshot.cycles, snapshot.cursor
    );
    if let Some(report) = &snapshot.last_report {
        text.push_str("\nLast report: ");
        text.push_str(report);
    }
    if let Some(error) = &snapshot.last_error {
        text.push_str("\nLast error: ");
        text.push_str(error);
    }
    text
}
