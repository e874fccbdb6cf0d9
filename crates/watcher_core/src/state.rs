use crate::{ChangeTracker, Cursor, ErrorDeduper, Report};

/// How the most recent cycle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing new since the cursor.
    NoUpdates,
    /// The newest report equals the last delivered one.
    Unchanged,
    /// A new report was delivered.
    Notified,
    /// An error was delivered.
    ErrorReported,
    /// An error repeated the last delivered one.
    ErrorSuppressed,
    /// An error could not be delivered; it was only logged.
    ErrorUnreported,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchState {
    cursor: Cursor,
    /// Where the cursor moves once the pending report is delivered.
    pending_cursor: Option<Cursor>,
    cycles: u64,
    reports: ChangeTracker,
    errors: ErrorDeduper,
    outcome: Option<CycleOutcome>,
}

impl WatchState {
    pub fn new(cursor: Cursor) -> Self {
        Self {
            cursor,
            ..Self::default()
        }
    }

    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// `None` while the current cycle still waits for a delivery result.
    pub fn outcome(&self) -> Option<CycleOutcome> {
        self.outcome
    }

    pub fn view(&self) -> WatchSnapshot {
        WatchSnapshot {
            cycles: self.cycles,
            cursor: self.cursor,
            last_report: self.reports.last().map(|report| report.message.clone()),
            last_error: self.errors.last().map(str::to_owned),
            outcome: self.outcome,
        }
    }

    pub(crate) fn begin_cycle(&mut self) {
        self.cycles += 1;
        self.outcome = None;
        self.pending_cursor = None;
    }

    pub(crate) fn hold_cursor(&mut self, to: Cursor) {
        self.pending_cursor = Some(to);
    }

    pub(crate) fn release_cursor(&mut self) {
        if let Some(to) = self.pending_cursor.take() {
            self.advance_cursor(to);
        }
    }

    pub(crate) fn drop_pending_cursor(&mut self) {
        self.pending_cursor = None;
    }

    pub(crate) fn advance_cursor(&mut self, to: Cursor) {
        self.cursor = self.cursor.max(to);
    }

    pub(crate) fn finish(&mut self, outcome: CycleOutcome) {
        self.outcome = Some(outcome);
    }

    pub(crate) fn reports(&self) -> &ChangeTracker {
        &self.reports
    }

    pub(crate) fn errors(&self) -> &ErrorDeduper {
        &self.errors
    }

    pub(crate) fn commit_report(&mut self, report: Report) {
        self.reports.commit(report);
    }

    pub(crate) fn commit_error(&mut self, signature: String) {
        self.errors.commit(signature);
    }

    pub(crate) fn clear_errors(&mut self) {
        self.errors.clear();
    }
}

/// Read-only summary of the watcher, safe to hand to other tasks.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WatchSnapshot {
    pub cycles: u64,
    pub cursor: Cursor,
    pub last_report: Option<String>,
    pub last_error: Option<String>,
    pub outcome: Option<CycleOutcome>,
}
