use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use watcher_core::{CycleOutcome, WatchSnapshot};
use watcher_engine::{
    ControlCommand, FetchSettings, ReqwestStatusFetcher, Scheduler, SchedulerSettings,
    TelegramBot, TelegramSettings,
};
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const STATUS_PATH: &str = "/api/user_api/homework_statuses/";
const SEND_PATH: &str = "/botbot-token/sendMessage";
const START: i64 = 1_700_000_000;
const HW1_REVIEWING: &str = "Status changed for \"hw1\". Работа взята на проверку ревьюером.";

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(watch_logging::initialize_for_tests);
}

struct Harness {
    practicum: MockServer,
    telegram: MockServer,
    now: Arc<AtomicI64>,
}

impl Harness {
    async fn start() -> Self {
        init_logging();
        Self {
            practicum: MockServer::start().await,
            telegram: MockServer::start().await,
            now: Arc::new(AtomicI64::new(START + 600)),
        }
    }

    fn scheduler(&self, interval: Duration) -> Scheduler {
        let fetcher = ReqwestStatusFetcher::new(FetchSettings {
            endpoint: format!("{}{}", self.practicum.uri(), STATUS_PATH),
            token: "practicum-token".to_string(),
            ..FetchSettings::default()
        })
        .expect("fetch client");
        let bot = TelegramBot::new(TelegramSettings {
            api_url: self.telegram.uri(),
            bot_token: "bot-token".to_string(),
            chat_id: "42".to_string(),
            ..TelegramSettings::default()
        })
        .expect("telegram client");
        let now = self.now.clone();
        Scheduler::new(
            Arc::new(fetcher),
            Arc::new(bot),
            Arc::new(move || now.load(Ordering::SeqCst)),
            SchedulerSettings { interval },
            START,
        )
    }

    fn advance_clock(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    async fn serve_status(&self, template: ResponseTemplate) {
        self.practicum.reset().await;
        Mock::given(method("GET"))
            .and(path(STATUS_PATH))
            .respond_with(template)
            .mount(&self.practicum)
            .await;
    }

    async fn serve_payload(&self, payload: Value) {
        self.serve_status(ResponseTemplate::new(200).set_body_json(payload))
            .await;
    }

    async fn accept_messages(&self) {
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"ok": true, "result": {"message_id": 1}})),
            )
            .mount(&self.telegram)
            .await;
    }

    async fn reject_messages(&self) {
        Mock::given(method("POST"))
            .and(path(SEND_PATH))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "ok": false,
                "description": "Bad Request: chat not found"
            })))
            .mount(&self.telegram)
            .await;
    }

    async fn sent_texts(&self) -> Vec<String> {
        self.telegram
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == SEND_PATH)
            .map(|request| {
                let body: Value = request.body_json().expect("json body");
                body["text"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }
}

fn hw1_reviewing() -> Value {
    json!({"homeworks": [{"homework_name": "hw1", "status": "reviewing"}]})
}

#[tokio::test]
async fn first_cycle_notifies_and_identical_second_cycle_stays_quiet() {
    let harness = Harness::start().await;
    harness.serve_payload(hw1_reviewing()).await;
    harness.accept_messages().await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));

    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::Notified));
    assert_eq!(harness.sent_texts().await, vec![HW1_REVIEWING.to_string()]);

    harness.advance_clock(600);
    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::Unchanged));
    assert_eq!(harness.sent_texts().await.len(), 1);
    assert_eq!(
        scheduler.state().view().last_report.as_deref(),
        Some(HW1_REVIEWING)
    );
}

#[tokio::test]
async fn empty_list_is_quiet_and_moves_the_cursor() {
    let harness = Harness::start().await;
    harness.accept_messages().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(query_param("from_date", START.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"homeworks": []})))
        .expect(1)
        .mount(&harness.practicum)
        .await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(query_param("from_date", (START + 600).to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"current_date": 1})))
        .expect(1)
        .mount(&harness.practicum)
        .await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));

    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::NoUpdates));
    assert_eq!(scheduler.state().cursor(), START + 600);

    harness.advance_clock(600);
    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::NoUpdates));
    assert_eq!(scheduler.state().cursor(), START + 1200);
    assert!(harness.sent_texts().await.is_empty());
}

#[tokio::test]
async fn http_failure_is_reported_once_and_keeps_the_cursor() {
    let harness = Harness::start().await;
    harness.serve_status(ResponseTemplate::new(503)).await;
    harness.accept_messages().await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));

    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::ErrorReported));
    harness.advance_clock(600);
    assert_eq!(
        scheduler.run_cycle().await,
        Some(CycleOutcome::ErrorSuppressed)
    );

    assert_eq!(
        harness.sent_texts().await,
        vec!["UnexpectedHTTPStatus: expected HTTP 200, got 503 Service Unavailable".to_string()]
    );
    assert_eq!(scheduler.state().cursor(), START);
}

#[tokio::test]
async fn unknown_status_is_reported() {
    let harness = Harness::start().await;
    harness
        .serve_payload(json!({"homeworks": [{"homework_name": "hw1", "status": "bogus"}]}))
        .await;
    harness.accept_messages().await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));

    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::ErrorReported));
    assert_eq!(
        harness.sent_texts().await,
        vec!["UnknownStatus: unknown homework status `bogus`".to_string()]
    );
}

#[tokio::test]
async fn status_change_after_error_is_reported() {
    let harness = Harness::start().await;
    harness.serve_status(ResponseTemplate::new(500)).await;
    harness.accept_messages().await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));
    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::ErrorReported));

    harness.serve_payload(hw1_reviewing()).await;
    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::Notified));

    harness
        .serve_payload(json!({"homeworks": [{"homework_name": "hw1", "status": "approved"}]}))
        .await;
    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::Notified));
    assert_eq!(harness.sent_texts().await.len(), 3);
}

#[tokio::test]
async fn failed_error_report_is_swallowed_and_retried_next_cycle() {
    let harness = Harness::start().await;
    harness.serve_status(ResponseTemplate::new(503)).await;
    harness.reject_messages().await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));

    assert_eq!(
        scheduler.run_cycle().await,
        Some(CycleOutcome::ErrorUnreported)
    );
    assert_eq!(scheduler.state().view().last_error, None);

    assert_eq!(
        scheduler.run_cycle().await,
        Some(CycleOutcome::ErrorUnreported)
    );
    assert_eq!(harness.sent_texts().await.len(), 2);
}

#[tokio::test]
async fn failed_report_delivery_is_reported_as_an_error() {
    let harness = Harness::start().await;
    harness.serve_payload(hw1_reviewing()).await;
    harness.reject_messages().await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));

    assert_eq!(
        scheduler.run_cycle().await,
        Some(CycleOutcome::ErrorUnreported)
    );
    assert_eq!(
        harness.sent_texts().await,
        vec![
            HW1_REVIEWING.to_string(),
            "DeliveryFailure: message was not delivered: telegram rejected sendMessage: Bad Request: chat not found"
                .to_string(),
        ]
    );
    assert_eq!(scheduler.state().view().last_report, None);
}

#[tokio::test]
async fn report_lost_in_delivery_is_fetched_and_sent_next_cycle() {
    let harness = Harness::start().await;
    Mock::given(method("GET"))
        .and(path(STATUS_PATH))
        .and(query_param("from_date", START.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(hw1_reviewing()))
        .expect(2)
        .mount(&harness.practicum)
        .await;
    // The report and its DeliveryFailure error report both bounce, then Telegram recovers.
    Mock::given(method("POST"))
        .and(path(SEND_PATH))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .mount(&harness.telegram)
        .await;
    harness.accept_messages().await;
    let mut scheduler = harness.scheduler(Duration::from_secs(600));

    assert_eq!(
        scheduler.run_cycle().await,
        Some(CycleOutcome::ErrorUnreported)
    );
    assert_eq!(scheduler.state().cursor(), START);

    harness.advance_clock(600);
    assert_eq!(scheduler.run_cycle().await, Some(CycleOutcome::Notified));
    assert_eq!(scheduler.state().cursor(), START + 1200);
    assert_eq!(harness.sent_texts().await.last().map(String::as_str), Some(HW1_REVIEWING));
}

async fn wait_for(
    snapshots: &mut watch::Receiver<WatchSnapshot>,
    condition: impl FnMut(&WatchSnapshot) -> bool,
) {
    tokio::time::timeout(Duration::from_secs(5), snapshots.wait_for(condition))
        .await
        .expect("timed out waiting for scheduler")
        .expect("scheduler dropped");
}

#[tokio::test]
async fn run_applies_commands_while_sleeping_and_stops_on_cancel() {
    let harness = Harness::start().await;
    harness.serve_status(ResponseTemplate::new(503)).await;
    harness.accept_messages().await;

    let (command_tx, command_rx) = mpsc::unbounded_channel();
    let scheduler = harness
        .scheduler(Duration::from_secs(3600))
        .with_commands(command_rx);
    let mut snapshots = scheduler.subscribe();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));

    wait_for(&mut snapshots, |snapshot| snapshot.last_error.is_some()).await;
    assert_eq!(snapshots.borrow().cycles, 1);

    command_tx
        .send(ControlCommand::ClearErrorCache)
        .expect("scheduler listening");
    wait_for(&mut snapshots, |snapshot| snapshot.last_error.is_none()).await;

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("scheduler stopped")
        .expect("scheduler task");
    assert_eq!(harness.sent_texts().await.len(), 1);
}

#[tokio::test]
async fn run_keeps_cycling_until_cancelled() {
    let harness = Harness::start().await;
    harness.serve_payload(json!({})).await;
    harness.accept_messages().await;

    let scheduler = harness.scheduler(Duration::from_millis(10));
    let mut snapshots = scheduler.subscribe();
    let cancel = CancellationToken::new();
    let task = tokio::spawn(scheduler.run(cancel.clone()));

    wait_for(&mut snapshots, |snapshot| snapshot.cycles >= 3).await;
    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .expect("scheduler stopped")
        .expect("scheduler task");
    assert!(harness.sent_texts().await.is_empty());
}
