use serde_json::{Map, Value};

use crate::{HomeworkRecord, WatchError};

const HOMEWORKS_KEY: &str = "homeworks";

/// Result of validating a payload that had the expected shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Validated {
    /// No `homeworks` key, or an empty list: nothing new since the cursor.
    NoUpdates,
    /// Newest record first; never empty.
    Homeworks(Vec<HomeworkRecord>),
}

/// Check the shape of a status payload before any field is read.
pub fn validate(payload: &Value) -> Result<Validated, WatchError> {
    let object = payload
        .as_object()
        .ok_or_else(|| WatchError::malformed("a JSON object", json_type(payload)))?;

    let Some(homeworks) = object.get(HOMEWORKS_KEY) else {
        return Ok(Validated::NoUpdates);
    };
    let homeworks = homeworks.as_array().ok_or_else(|| {
        WatchError::malformed("`homeworks` to be a list", json_type(homeworks))
    })?;

    if homeworks.is_empty() {
        return Ok(Validated::NoUpdates);
    }

    homeworks
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            entry.as_object().map(record_from_object).ok_or_else(|| {
                WatchError::malformed(
                    format!("`homeworks[{index}]` to be an object"),
                    json_type(entry),
                )
            })
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Validated::Homeworks)
}

fn record_from_object(object: &Map<String, Value>) -> HomeworkRecord {
    let text = |key: &str| object.get(key).and_then(Value::as_str).map(str::to_owned);
    HomeworkRecord {
        name: text("homework_name"),
        status: text("status"),
        updated_at: text("date_updated"),
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
