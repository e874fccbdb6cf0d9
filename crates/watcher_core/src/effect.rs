use crate::Report;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Notify(Delivery),
}

/// A message to send, and what to commit once it has been delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Report(Report),
    ErrorReport { signature: String },
}

impl Delivery {
    pub fn text(&self) -> &str {
        match self {
            Delivery::Report(report) => &report.message,
            Delivery::ErrorReport { signature } => signature,
        }
    }

    pub fn is_error_report(&self) -> bool {
        matches!(self, Delivery::ErrorReport { .. })
    }
}
