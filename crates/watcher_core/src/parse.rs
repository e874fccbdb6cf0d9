use crate::verdict::verdict_for;
use crate::{HomeworkRecord, Report, Subject, WatchError};

/// Build the report for the newest record (`records[0]`).
///
/// Returns `None` for an empty slice; [`crate::validate`] never produces one.
pub fn parse(records: &[HomeworkRecord]) -> Option<Result<Report, WatchError>> {
    records.first().map(parse_record)
}

pub fn parse_record(record: &HomeworkRecord) -> Result<Report, WatchError> {
    let name = record
        .name
        .as_deref()
        .filter(|name| !name.trim().is_empty())
        .ok_or(WatchError::MissingName)?;

    let status = record.status.as_deref();
    let verdict = status
        .and_then(verdict_for)
        .ok_or_else(|| WatchError::UnknownStatus {
            status: status.map(str::to_owned),
        })?;

    let subject = match record.updated_at.as_deref() {
        Some(updated) if !updated.is_empty() => Subject::Updated(updated.to_string()),
        _ => Subject::NameStatus {
            name: name.to_string(),
            status: status.unwrap_or_default().to_string(),
        },
    };

    Ok(Report {
        subject,
        message: format!("Status changed for \"{name}\". {verdict}"),
    })
}
