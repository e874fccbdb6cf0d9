use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use watch_logging::watch_info;
use watcher_core::WatchError;

pub const DEFAULT_TELEGRAM_API: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramSettings {
    pub api_url: String,
    pub bot_token: String,
    /// Destination for notifications; also the only chat whose commands are obeyed.
    pub chat_id: String,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_TELEGRAM_API.to_string(),
            bot_token: String::new(),
            chat_id: String::new(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Transport(String),
    #[error("telegram rejected {method}: {description}")]
    Rejected { method: String, description: String },
    #[error("unreadable telegram response to {method}: {message}")]
    Decode { method: String, message: String },
}

impl From<TelegramError> for WatchError {
    fn from(err: TelegramError) -> Self {
        WatchError::Delivery {
            message: err.to_string(),
        }
    }
}

/// Sends text to the configured chat.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), WatchError>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplyKeyboard {
    keyboard: Vec<Vec<KeyboardButton>>,
    resize_keyboard: bool,
}

#[derive(Debug, Clone, Serialize)]
struct KeyboardButton {
    text: String,
}

impl ReplyKeyboard {
    pub fn single_row<'a>(buttons: impl IntoIterator<Item = &'a str>) -> Self {
        let row = buttons
            .into_iter()
            .map(|text| KeyboardButton {
                text: text.to_string(),
            })
            .collect();
        Self {
            keyboard: vec![row],
            resize_keyboard: true,
        }
    }
}

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reply_markup: Option<&'a ReplyKeyboard>,
}

#[derive(Serialize)]
struct GetUpdates {
    #[serde(skip_serializing_if = "Option::is_none")]
    offset: Option<i64>,
    timeout: u64,
    allowed_updates: [&'static str; 1],
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
    result: Option<T>,
}

/// Minimal Bot API client: `sendMessage` and `getUpdates`.
#[derive(Debug, Clone)]
pub struct TelegramBot {
    settings: TelegramSettings,
    client: reqwest::Client,
}

impl TelegramBot {
    pub fn new(settings: TelegramSettings) -> Result<Self, TelegramError> {
        let client = reqwest::Client::builder()
            .connect_timeout(settings.connect_timeout)
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| TelegramError::Transport(err.to_string()))?;
        Ok(Self { settings, client })
    }

    pub fn chat_id(&self) -> &str {
        &self.settings.chat_id
    }

    pub async fn send_message(
        &self,
        chat_id: &str,
        text: &str,
        reply_markup: Option<&ReplyKeyboard>,
    ) -> Result<(), TelegramError> {
        let body = SendMessage {
            chat_id,
            text,
            reply_markup,
        };
        // The result is the sent Message; only its presence matters.
        self.call::<_, serde_json::Value>("sendMessage", &body)
            .await
            .map(|_| ())
    }

    /// Long-poll for new updates after `offset`, waiting up to `timeout_secs`.
    pub async fn get_updates(
        &self,
        offset: Option<i64>,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, TelegramError> {
        let body = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: ["message"],
        };
        self.call("getUpdates", &body).await
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TelegramError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!(
            "{}/bot{}/{}",
            self.settings.api_url.trim_end_matches('/'),
            self.settings.bot_token,
            method
        );
        // reqwest errors carry the URL, which carries the token.
        let response = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|err| TelegramError::Transport(err.without_url().to_string()))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|err| TelegramError::Transport(err.without_url().to_string()))?;

        let parsed: ApiResponse<T> = match serde_json::from_slice(&bytes) {
            Ok(parsed) => parsed,
            Err(_) if !status.is_success() => {
                return Err(TelegramError::Rejected {
                    method: method.to_string(),
                    description: format!("HTTP {status}"),
                });
            }
            Err(err) => {
                return Err(TelegramError::Decode {
                    method: method.to_string(),
                    message: err.to_string(),
                });
            }
        };

        if !parsed.ok {
            return Err(TelegramError::Rejected {
                method: method.to_string(),
                description: parsed
                    .description
                    .unwrap_or_else(|| format!("HTTP {status}")),
            });
        }
        parsed.result.ok_or_else(|| TelegramError::Decode {
            method: method.to_string(),
            message: "missing `result`".to_string(),
        })
    }
}

#[async_trait::async_trait]
impl Notifier for TelegramBot {
    async fn notify(&self, text: &str) -> Result<(), WatchError> {
        self.send_message(&self.settings.chat_id, text, None).await?;
        watch_info!("Sent message to chat {}: {}", self.settings.chat_id, text);
        Ok(())
    }
}
