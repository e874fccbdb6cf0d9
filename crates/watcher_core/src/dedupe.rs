use crate::Report;

/// Remembers the last report that was actually delivered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ChangeTracker {
    last: Option<Report>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// True unless `report` has the same subject and message as the last delivered one.
    pub fn should_notify(&self, report: &Report) -> bool {
        self.last.as_ref() != Some(report)
    }

    /// Record a delivered report.
    pub fn commit(&mut self, report: Report) {
        self.last = Some(report);
    }

    pub fn last(&self) -> Option<&Report> {
        self.last.as_ref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

/// Remembers the signature of the last error that was actually delivered.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorDeduper {
    last: Option<String>,
}

impl ErrorDeduper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn should_notify(&self, signature: &str) -> bool {
        self.last.as_deref() != Some(signature)
    }

    pub fn commit(&mut self, signature: impl Into<String>) {
        self.last = Some(signature.into());
    }

    pub fn last(&self) -> Option<&str> {
        self.last.as_deref()
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}
