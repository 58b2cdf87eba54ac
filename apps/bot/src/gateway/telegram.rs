//! Telegram Bot API client. The only module that talks to Telegram.
//!
//! Covers long polling (`getUpdates`), outbound messages (`sendMessage`,
//! `editMessageText`) and callback acknowledgement (`answerCallbackQuery`).

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::conversation::keyboards::Controls;
use crate::gateway::{GatewayError, MessagingGateway};

const MAX_RETRIES: u32 = 3;
/// Extra HTTP time on top of the long-poll timeout.
const HTTP_SLACK_SECS: u64 = 10;
const NOT_MODIFIED: &str = "message is not modified";

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Serialize)]
struct GetUpdates {
    offset: i64,
    timeout: u64,
    allowed_updates: &'static [&'static str],
}

/// Where the bot's last message to a user lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MessageRef {
    chat_id: i64,
    message_id: i64,
}

pub struct TelegramGateway {
    client: Client,
    /// `<api_url>/bot<token>`; never logged.
    endpoint: String,
    /// One entry per user the bot has messaged; never evicted, so it grows
    /// with the user count.
    last_messages: Mutex<HashMap<String, MessageRef>>,
}

impl TelegramGateway {
    pub fn new(api_url: &str, token: &str, poll_timeout_secs: u64) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(poll_timeout_secs + HTTP_SLACK_SECS))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/bot{token}", api_url.trim_end_matches('/')),
            last_messages: Mutex::new(HashMap::new()),
        })
    }

    /// Calls one Bot API method.
    /// Retries on 429 and 5xx with exponential backoff.
    async fn call<P: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<T, GatewayError> {
        let url = format!("{}/{method}", self.endpoint);
        let mut last_error: Option<GatewayError> = None;

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                let delay = backoff_delay(attempt);
                warn!(
                    "Telegram {method} attempt {} failed, retrying after {}ms...",
                    attempt,
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            let response = match self.client.post(&url).json(params).send().await {
                Ok(r) => r,
                Err(e) => {
                    last_error = Some(GatewayError::Http(e));
                    continue;
                }
            };

            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 || status.is_server_error() {
                warn!("Telegram {method} returned {status}: {body}");
                last_error = Some(GatewayError::Api {
                    status: status.as_u16(),
                    message: body,
                });
                continue;
            }

            return decode_response(status.as_u16(), &body);
        }

        Err(last_error.unwrap_or(GatewayError::RateLimited {
            retries: MAX_RETRIES,
        }))
    }

    pub async fn get_updates(
        &self,
        offset: i64,
        timeout_secs: u64,
    ) -> Result<Vec<Update>, GatewayError> {
        let params = GetUpdates {
            offset,
            timeout: timeout_secs,
            allowed_updates: &["message", "callback_query"],
        };
        self.call("getUpdates", &params).await
    }

    pub async fn answer_callback_query(&self, query_id: &str) -> Result<(), GatewayError> {
        let _: bool = self
            .call("answerCallbackQuery", &json!({ "callback_query_id": query_id }))
            .await?;
        Ok(())
    }

    /// Remembers the message a user last saw from the bot, so the next edit
    /// targets it.
    pub fn remember_message(&self, user_id: &str, chat_id: i64, message_id: i64) {
        if let Ok(mut last) = self.last_messages.lock() {
            last.insert(user_id.to_string(), MessageRef { chat_id, message_id });
        }
    }

    fn last_message(&self, user_id: &str) -> Option<MessageRef> {
        self.last_messages
            .lock()
            .ok()
            .and_then(|last| last.get(user_id).copied())
    }
}

#[async_trait]
impl MessagingGateway for TelegramGateway {
    async fn send_message(
        &self,
        user_id: &str,
        text: &str,
        controls: Option<&Controls>,
    ) -> Result<(), GatewayError> {
        // Private chats share the user's id.
        let chat_id: i64 = user_id
            .parse()
            .map_err(|_| GatewayError::InvalidRecipient(user_id.to_string()))?;

        let mut params = json!({ "chat_id": chat_id, "text": text });
        if let Some(controls) = controls {
            params["reply_markup"] = reply_markup(controls);
        }

        let sent: Message = self.call("sendMessage", &params).await?;
        self.remember_message(user_id, sent.chat.id, sent.message_id);
        debug!("Sent message {} to {user_id}", sent.message_id);
        Ok(())
    }

    async fn edit_last_message(
        &self,
        user_id: &str,
        text: &str,
        controls: Option<&Controls>,
    ) -> Result<(), GatewayError> {
        // Only inline keyboards can be attached to an edited message.
        let target = match (self.last_message(user_id), controls) {
            (Some(target), None) => target,
            (Some(target), Some(c)) if c.is_inline() => target,
            _ => return self.send_message(user_id, text, controls).await,
        };

        let mut params = json!({
            "chat_id": target.chat_id,
            "message_id": target.message_id,
            "text": text,
        });
        if let Some(controls) = controls {
            params["reply_markup"] = reply_markup(controls);
        }

        match self.call::<_, Value>("editMessageText", &params).await {
            Ok(_) => Ok(()),
            Err(GatewayError::Api { message, .. }) if message.contains(NOT_MODIFIED) => {
                debug!("Message {} for {user_id} already up to date", target.message_id);
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}

/// Wait before retry number `attempt` (1-based): 1s, 2s, 4s, ...
fn backoff_delay(attempt: u32) -> Duration {
    Duration::from_secs(1 << attempt.saturating_sub(1).min(6))
}

fn decode_response<T: DeserializeOwned>(status: u16, body: &str) -> Result<T, GatewayError> {
    let parsed: ApiResponse<T> = serde_json::from_str(body).map_err(|e| GatewayError::Api {
        status,
        message: format!("undecodable response: {e}"),
    })?;

    match (parsed.ok, parsed.result) {
        (true, Some(result)) => Ok(result),
        _ => Err(GatewayError::Api {
            status,
            message: parsed
                .description
                .unwrap_or_else(|| "request failed".to_string()),
        }),
    }
}

/// Bot API `reply_markup` for the given controls.
pub fn reply_markup(controls: &Controls) -> Value {
    match controls {
        Controls::Prompt(label) => json!({
            "keyboard": [[{ "text": label }]],
            "resize_keyboard": true,
        }),
        Controls::Inline(rows) => {
            let rows: Vec<Vec<Value>> = rows
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|b| json!({ "text": b.label, "callback_data": b.callback.encode() }))
                        .collect()
                })
                .collect();
            json!({ "inline_keyboard": rows })
        }
    }
}
