use crate::{
    parse, validate, CycleOutcome, Delivery, Effect, Msg, Validated, WatchError, WatchState,
};

/// Pure update function: applies a message to state and returns any effects.
///
/// Caches are only written on `Msg::Delivered`, so a report or error is never
/// considered sent before the channel accepted it. The cursor only moves when
/// a cycle succeeds: no updates, an unchanged report, or a delivered report.
pub fn update(mut state: WatchState, msg: Msg) -> (WatchState, Vec<Effect>) {
    let effects = match msg {
        Msg::PayloadFetched {
            started_at,
            payload,
        } => {
            state.begin_cycle();
            match validate(&payload) {
                Err(error) => report_error(&mut state, error),
                Ok(Validated::NoUpdates) => {
                    state.advance_cursor(started_at);
                    state.finish(CycleOutcome::NoUpdates);
                    Vec::new()
                }
                Ok(Validated::Homeworks(records)) => {
                    match parse(&records) {
                        None => {
                            state.advance_cursor(started_at);
                            state.finish(CycleOutcome::NoUpdates);
                            Vec::new()
                        }
                        Some(Err(error)) => report_error(&mut state, error),
                        Some(Ok(report)) => {
                            if state.reports().should_notify(&report) {
                                state.hold_cursor(started_at);
                                vec![Effect::Notify(Delivery::Report(report))]
                            } else {
                                state.advance_cursor(started_at);
                                state.finish(CycleOutcome::Unchanged);
                                Vec::new()
                            }
                        }
                    }
                }
            }
        }
        Msg::FetchFailed(error) => {
            state.begin_cycle();
            report_error(&mut state, error)
        }
        Msg::Delivered(delivery) => {
            match delivery {
                Delivery::Report(report) => {
                    state.commit_report(report);
                    state.release_cursor();
                    state.finish(CycleOutcome::Notified);
                }
                Delivery::ErrorReport { signature } => {
                    state.commit_error(signature);
                    state.finish(CycleOutcome::ErrorReported);
                }
            }
            Vec::new()
        }
        Msg::DeliveryFailed { delivery, error } => match delivery {
            Delivery::Report(_) => {
                // Keep the cursor so the same record is fetched and retried.
                state.drop_pending_cursor();
                report_error(&mut state, error)
            }
            // Failing to report a failure is never reported again.
            Delivery::ErrorReport { .. } => {
                state.finish(CycleOutcome::ErrorUnreported);
                Vec::new()
            }
        },
        Msg::ClearErrorCache => {
            state.clear_errors();
            Vec::new()
        }
    };

    (state, effects)
}

fn report_error(state: &mut WatchState, error: WatchError) -> Vec<Effect> {
    let signature = error.signature();
    if state.errors().should_notify(&signature) {
        vec![Effect::Notify(Delivery::ErrorReport { signature })]
    } else {
        state.finish(CycleOutcome::ErrorSuppressed);
        Vec::new()
    }
}
