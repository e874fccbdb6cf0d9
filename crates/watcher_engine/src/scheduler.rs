use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use watch_logging::{watch_debug, watch_error, watch_info};
use watcher_core::{update, Cursor, CycleOutcome, Delivery, Effect, Msg, WatchSnapshot, WatchState};

use crate::commands::ControlCommand;
use crate::fetch::StatusFetcher;
use crate::telegram::Notifier;

/// Source of "now" in epoch seconds.
pub type Clock = Arc<dyn Fn() -> Cursor + Send + Sync>;

#[derive(Debug, Clone)]
pub struct SchedulerSettings {
    pub interval: Duration,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(600),
        }
    }
}

/// Runs one fetch/notify cycle per interval. The only writer of [`WatchState`].
pub struct Scheduler {
    fetcher: Arc<dyn StatusFetcher>,
    notifier: Arc<dyn Notifier>,
    clock: Clock,
    settings: SchedulerSettings,
    state: WatchState,
    commands: Option<mpsc::UnboundedReceiver<ControlCommand>>,
    snapshot: watch::Sender<WatchSnapshot>,
}

impl Scheduler {
    pub fn new(
        fetcher: Arc<dyn StatusFetcher>,
        notifier: Arc<dyn Notifier>,
        clock: Clock,
        settings: SchedulerSettings,
        initial_cursor: Cursor,
    ) -> Self {
        let state = WatchState::new(initial_cursor);
        let (snapshot, _) = watch::channel(state.view());
        Self {
            fetcher,
            notifier,
            clock,
            settings,
            state,
            commands: None,
            snapshot,
        }
    }

    pub fn with_commands(mut self, commands: mpsc::UnboundedReceiver<ControlCommand>) -> Self {
        self.commands = Some(commands);
        self
    }

    /// Follow the state summary after every cycle and command.
    pub fn subscribe(&self) -> watch::Receiver<WatchSnapshot> {
        self.snapshot.subscribe()
    }

    pub fn state(&self) -> &WatchState {
        &self.state
    }

    /// Run cycles until `cancel` fires. A cycle in flight always completes.
    pub async fn run(mut self, cancel: CancellationToken) {
        watch_info!(
            "Watching every {}s starting from {}",
            self.settings.interval.as_secs(),
            self.state.cursor()
        );
        loop {
            self.drain_commands();
            self.run_cycle().await;
            if !self.sleep(&cancel).await {
                break;
            }
        }
        watch_info!("Scheduler stopped after {} cycles", self.state.view().cycles);
    }

    /// Fetch, validate, parse, decide and notify once.
    ///
    /// Returns `None` only if a delivery result never came back, which the
    /// notifier contract rules out.
    pub async fn run_cycle(&mut self) -> Option<CycleOutcome> {
        let started_at = (self.clock)();
        let msg = match self.fetcher.fetch(self.state.cursor()).await {
            Ok(payload) => Msg::PayloadFetched {
                started_at,
                payload,
            },
            Err(error) => Msg::FetchFailed(error),
        };

        let mut pending: VecDeque<Effect> = self.apply(msg).into();
        while let Some(Effect::Notify(delivery)) = pending.pop_front() {
            let msg = match self.notifier.notify(delivery.text()).await {
                Ok(()) => Msg::Delivered(delivery),
                Err(error) => {
                    if delivery.is_error_report() {
                        watch_error!(
                            "Could not deliver error report \"{}\": {}",
                            delivery.text(),
                            error
                        );
                    }
                    Msg::DeliveryFailed { delivery, error }
                }
            };
            pending.extend(self.apply(msg));
        }

        let outcome = self.state.outcome();
        match outcome {
            Some(CycleOutcome::NoUpdates) => watch_debug!("No updates"),
            Some(CycleOutcome::Unchanged) => watch_debug!("Status unchanged, nothing sent"),
            Some(CycleOutcome::ErrorSuppressed) => {
                let last = self.state.view().last_error.unwrap_or_default();
                watch_debug!("{} (already reported, not sending again)", last);
            }
            _ => {}
        }
        self.snapshot.send_replace(self.state.view());
        outcome
    }

    fn apply(&mut self, msg: Msg) -> Vec<Effect> {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        for effect in &effects {
            let Effect::Notify(Delivery::ErrorReport { signature }) = effect else {
                continue;
            };
            watch_error!("{}", signature);
        }
        effects
    }

    fn apply_command(&mut self, command: ControlCommand) {
        match command {
            ControlCommand::ClearErrorCache => {
                self.apply(Msg::ClearErrorCache);
                watch_info!("Error cache cleared");
            }
        }
        self.snapshot.send_replace(self.state.view());
    }

    fn drain_commands(&mut self) {
        while let Some(command) = self
            .commands
            .as_mut()
            .and_then(|commands| commands.try_recv().ok())
        {
            self.apply_command(command);
        }
    }

    /// Wait out the interval, applying commands as they arrive.
    /// Returns false when cancelled.
    async fn sleep(&mut self, cancel: &CancellationToken) -> bool {
        let deadline = Instant::now() + self.settings.interval;
        loop {
            let command = tokio::select! {
                _ = cancel.cancelled() => return false,
                _ = tokio::time::sleep_until(deadline) => return true,
                Some(command) = next_command(&mut self.commands) => command,
            };
            self.apply_command(command);
        }
    }
}

async fn next_command(
    commands: &mut Option<mpsc::UnboundedReceiver<ControlCommand>>,
) -> Option<ControlCommand> {
    match commands {
        Some(commands) => commands.recv().await,
        None => std::future::pending().await,
    }
}
