/// Epoch seconds; the remote API returns everything updated at or after it.
pub type Cursor = i64;

/// One homework entry as returned by the status API.
///
/// Fields are optional because the payload is only checked for shape; the
/// parser decides whether a missing field is a failure.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HomeworkRecord {
    pub name: Option<String>,
    pub status: Option<String>,
    pub updated_at: Option<String>,
}

impl HomeworkRecord {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            status: Some(status.into()),
            updated_at: None,
        }
    }

    pub fn updated_at(mut self, updated_at: impl Into<String>) -> Self {
        self.updated_at = Some(updated_at.into());
        self
    }
}

/// What a report is about. Two reports with equal subjects and messages are the same news.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// The record's `date_updated` marker.
    Updated(String),
    /// Fallback when the record has no update marker.
    NameStatus { name: String, status: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub subject: Subject,
    pub message: String,
}
