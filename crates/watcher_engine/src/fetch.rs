use std::time::Duration;

use reqwest::header::AUTHORIZATION;
use reqwest::StatusCode;
use serde_json::Value;
use watch_logging::{watch_debug, watch_info};
use watcher_core::{Cursor, WatchError};

pub const DEFAULT_ENDPOINT: &str = "https://practicum.yandex.ru/api/user_api/homework_statuses/";

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub endpoint: String,
    pub token: String,
    pub connect_timeout: Duration,
    /// Unset by default: a slow answer only delays the next cycle.
    pub request_timeout: Option<Duration>,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: None,
        }
    }
}

/// One request for the homeworks updated since a cursor.
#[async_trait::async_trait]
pub trait StatusFetcher: Send + Sync {
    async fn fetch(&self, cursor: Cursor) -> Result<Value, WatchError>;
}

#[derive(Debug, Clone)]
pub struct ReqwestStatusFetcher {
    settings: FetchSettings,
    client: reqwest::Client,
}

impl ReqwestStatusFetcher {
    pub fn new(settings: FetchSettings) -> Result<Self, WatchError> {
        let mut builder = reqwest::Client::builder().connect_timeout(settings.connect_timeout);
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|err| transport_error(&settings.endpoint, &err))?;
        Ok(Self { settings, client })
    }

    pub fn endpoint(&self) -> &str {
        &self.settings.endpoint
    }
}

#[async_trait::async_trait]
impl StatusFetcher for ReqwestStatusFetcher {
    async fn fetch(&self, cursor: Cursor) -> Result<Value, WatchError> {
        let endpoint = self.settings.endpoint.as_str();
        watch_info!("Requesting homework statuses from {} since {}", endpoint, cursor);

        let response = self
            .client
            .get(endpoint)
            .header(AUTHORIZATION, format!("OAuth {}", self.settings.token))
            .query(&[("from_date", cursor)])
            .send()
            .await
            .map_err(|err| transport_error(endpoint, &err))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(WatchError::UnexpectedHttpStatus {
                expected: StatusCode::OK.as_u16(),
                actual: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| transport_error(endpoint, &err))?;
        let payload = serde_json::from_slice::<Value>(&body).map_err(|err| {
            WatchError::MalformedResponse {
                expected: "a JSON body".to_string(),
                actual: err.to_string(),
            }
        })?;

        watch_info!("Received {} bytes from {}", body.len(), endpoint);
        watch_debug!("Payload: {}", payload);
        Ok(payload)
    }
}

fn transport_error(endpoint: &str, err: &reqwest::Error) -> WatchError {
    let message = if err.is_timeout() {
        format!("timed out: {err}")
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    };
    WatchError::Transport {
        endpoint: endpoint.to_string(),
        message,
    }
}
