use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_error, watch_info};
use watcher_engine::{
    CommandListener, ListenerSettings, ReqwestStatusFetcher, Scheduler, TelegramBot,
};

use crate::config::Config;

pub async fn run_app(config: Config) -> Result<()> {
    let fetcher = ReqwestStatusFetcher::new(config.fetch_settings())
        .context("building status API client")?;
    let bot = Arc::new(
        TelegramBot::new(config.telegram_settings()).context("building Telegram client")?,
    );

    let now = Utc::now().timestamp();
    let scheduler = Scheduler::new(
        Arc::new(fetcher),
        bot.clone(),
        Arc::new(|| Utc::now().timestamp()),
        config.scheduler_settings(),
        now.saturating_sub(config.lookback()),
    );

    let cancel = CancellationToken::new();
    let (scheduler, listener_task) = if config.no_commands {
        watch_info!("Chat commands disabled");
        (scheduler, None)
    } else {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let scheduler = scheduler.with_commands(command_rx);
        let listener = CommandListener::new(
            bot,
            command_tx,
            scheduler.subscribe(),
            ListenerSettings::default(),
        );
        let task = tokio::spawn(listener.run(cancel.clone()));
        (scheduler, Some(task))
    };

    let shutdown = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => watch_info!("Shutdown requested"),
            Err(err) => watch_error!("Could not listen for Ctrl-C: {}", err),
        }
        shutdown.cancel();
    });

    scheduler.run(cancel.clone()).await;
    cancel.cancel();
    if let Some(task) = listener_task {
        task.await.context("command listener panicked")?;
    }
    Ok(())
}
