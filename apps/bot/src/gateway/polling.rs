use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn};

use crate::conversation::messages;
use crate::conversation::service::Conversation;
use crate::conversation::Reply;
use crate::errors::BotError;
use crate::gateway::telegram::{TelegramGateway, Update};
use crate::gateway::{deliver, MessagingGateway};

const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// A platform update reduced to what the conversation core consumes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Text { user_id: String, text: String },
    Button { user_id: String, payload: String },
}

impl Inbound {
    pub fn user_id(&self) -> &str {
        match self {
            Inbound::Text { user_id, .. } | Inbound::Button { user_id, .. } => user_id,
        }
    }
}

/// Extracts the inbound event from a Telegram update, if it carries one.
pub fn inbound_from_update(update: &Update) -> Option<Inbound> {
    if let Some(query) = &update.callback_query {
        return Some(Inbound::Button {
            user_id: query.from.id.to_string(),
            payload: query.data.clone().unwrap_or_default(),
        });
    }

    let message = update.message.as_ref()?;
    let user_id = message.from.as_ref().map_or(message.chat.id, |u| u.id);
    Some(Inbound::Text {
        user_id: user_id.to_string(),
        text: message.text.clone()?,
    })
}

/// Runs one inbound event through the conversation and delivers the reply.
///
/// Per-event failures are logged and answered with a short apology; they
/// never propagate to the polling loop.
pub async fn handle_inbound(
    gateway: &dyn MessagingGateway,
    conversation: &Conversation,
    inbound: &Inbound,
) {
    let user_id = inbound.user_id();
    let result = match inbound {
        Inbound::Text { text, .. } => conversation.on_text(user_id, text).await,
        Inbound::Button { payload, .. } => conversation.on_button_press(user_id, payload).await,
    };

    let reply = match result {
        Ok(reply) => reply,
        Err(e @ BotError::StorageUnavailable(_)) => {
            error!("Event for user {user_id} aborted: {e}");
            Reply::send(messages::TEMPORARY_FAILURE, None)
        }
        Err(e) => {
            warn!("Event for user {user_id} failed: {e}");
            Reply::send(messages::TEMPORARY_FAILURE, None)
        }
    };

    if let Err(e) = deliver(gateway, user_id, &reply).await {
        error!("Delivery to user {user_id} failed: {e}");
    }
}

/// Long-polls Telegram forever, handling updates one at a time.
pub async fn run(gateway: Arc<TelegramGateway>, conversation: Arc<Conversation>, timeout_secs: u64) {
    info!("Polling Telegram for updates (timeout {timeout_secs}s)");
    let mut offset = 0;

    loop {
        let updates = match gateway.get_updates(offset, timeout_secs).await {
            Ok(updates) => updates,
            Err(e) => {
                warn!("getUpdates failed: {e}");
                tokio::time::sleep(ERROR_BACKOFF).await;
                continue;
            }
        };

        for update in updates {
            offset = update.update_id + 1;

            if let Some(query) = &update.callback_query {
                if let Some(message) = &query.message {
                    gateway.remember_message(
                        &query.from.id.to_string(),
                        message.chat.id,
                        message.message_id,
                    );
                }
                if let Err(e) = gateway.answer_callback_query(&query.id).await {
                    warn!("answerCallbackQuery failed: {e}");
                }
            }

            match inbound_from_update(&update) {
                Some(inbound) => {
                    handle_inbound(gateway.as_ref(), conversation.as_ref(), &inbound).await
                }
                None => info!("Skipping update {} without text or button", update.update_id),
            }
        }
    }
}
