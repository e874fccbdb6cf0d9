//! Watcher core: payload validation, report rendering and the pure cycle state machine.
mod dedupe;
mod effect;
mod error;
mod msg;
mod parse;
mod record;
mod state;
mod update;
mod validate;
mod verdict;

pub use dedupe::{ChangeTracker, ErrorDeduper};
pub use effect::{Delivery, Effect};
pub use error::{ErrorKind, WatchError};
pub use msg::Msg;
pub use parse::{parse, parse_record};
pub use record::{Cursor, HomeworkRecord, Report, Subject};
pub use state::{CycleOutcome, WatchSnapshot, WatchState};
pub use update::update;
pub use validate::{validate, Validated};
pub use verdict::{known_statuses, verdict_for};
