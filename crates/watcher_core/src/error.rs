use std::fmt;

/// The user-visible failure taxonomy of a watch cycle.
///
/// Every variant carries enough context to be acted on from the log or chat
/// message alone.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WatchError {
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },
    #[error("expected HTTP {expected}, got {actual} {reason}")]
    UnexpectedHttpStatus {
        expected: u16,
        actual: u16,
        reason: String,
    },
    #[error("expected {expected}, got {actual}")]
    MalformedResponse { expected: String, actual: String },
    #[error("homework record has no `homework_name`")]
    MissingName,
    #[error("{}", unknown_status_message(.status))]
    UnknownStatus { status: Option<String> },
    #[error("message was not delivered: {message}")]
    Delivery { message: String },
}

fn unknown_status_message(status: &Option<String>) -> String {
    match status {
        Some(status) => format!("unknown homework status `{status}`"),
        None => "homework record has no `status`".to_string(),
    }
}

impl WatchError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WatchError::Transport { .. } => ErrorKind::TransportFailure,
            WatchError::UnexpectedHttpStatus { .. } => ErrorKind::UnexpectedHttpStatus,
            WatchError::MalformedResponse { .. } => ErrorKind::MalformedResponse,
            WatchError::MissingName => ErrorKind::MissingName,
            WatchError::UnknownStatus { .. } => ErrorKind::UnknownStatus,
            WatchError::Delivery { .. } => ErrorKind::DeliveryFailure,
        }
    }

    /// Stable text identifying this exact fault. Also the text of the error notification.
    pub fn signature(&self) -> String {
        format!("{}: {}", self.kind(), self)
    }

    pub(crate) fn malformed(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        WatchError::MalformedResponse {
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TransportFailure,
    UnexpectedHttpStatus,
    MalformedResponse,
    MissingName,
    UnknownStatus,
    DeliveryFailure,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::TransportFailure => "TransportFailure",
            ErrorKind::UnexpectedHttpStatus => "UnexpectedHTTPStatus",
            ErrorKind::MalformedResponse => "MalformedResponse",
            ErrorKind::MissingName => "MissingName",
            ErrorKind::UnknownStatus => "UnknownStatus",
            ErrorKind::DeliveryFailure => "DeliveryFailure",
        };
        f.write_str(name)
    }
}
