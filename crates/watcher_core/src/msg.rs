use serde_json::Value;

use crate::{Cursor, Delivery, WatchError};

#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// The status API answered a request that was sent at `started_at`.
    PayloadFetched { started_at: Cursor, payload: Value },
    /// The request failed before a payload was decoded.
    FetchFailed(WatchError),
    /// The channel accepted a message.
    Delivered(Delivery),
    /// The channel rejected a message or could not be reached.
    DeliveryFailed { delivery: Delivery, error: WatchError },
    /// Operator asked to forget the last reported error.
    ClearErrorCache,
}
