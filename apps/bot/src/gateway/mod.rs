//! Messaging gateway: the transport between users and the conversation core.
//!
//! The core only produces `Reply` values. Implementations of
//! `MessagingGateway` turn them into platform calls.

pub mod polling;
pub mod telegram;

use async_trait::async_trait;
use thiserror::Error;

use crate::conversation::keyboards::Controls;
use crate::conversation::{Delivery, Reply};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Invalid recipient '{0}'")]
    InvalidRecipient(String),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },
}

/// Outbound side of the messaging platform.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    async fn send_message(
        &self,
        user_id: &str,
        text: &str,
        controls: Option<&Controls>,
    ) -> Result<(), GatewayError>;

    /// Replaces the last message the bot showed `user_id`.
    async fn edit_last_message(
        &self,
        user_id: &str,
        text: &str,
        controls: Option<&Controls>,
    ) -> Result<(), GatewayError>;
}

/// Delivers one reply the way it asks to be delivered.
pub async fn deliver(
    gateway: &dyn MessagingGateway,
    user_id: &str,
    reply: &Reply,
) -> Result<(), GatewayError> {
    match reply.delivery {
        Delivery::Send => {
            gateway
                .send_message(user_id, &reply.text, reply.controls.as_ref())
                .await
        }
        Delivery::EditLast => {
            gateway
                .edit_last_message(user_id, &reply.text, reply.controls.as_ref())
                .await
        }
    }
}


#[cfg(test)]
mod tests {
    use super::recording::RecordingGateway;
    use super::*;
    use crate::conversation::keyboards;

    #[tokio::test]
    async fn test_deliver_routes_by_delivery() {
        let gateway = RecordingGateway::default();

        deliver(&gateway, "1", &Reply::send("hi", None)).await.unwrap();
        deliver(
            &gateway,
            "1",
            &Reply::edit("grades", Some(keyboards::grade_choice())),
        )
        .await
        .unwrap();

        let sent = gateway.sent();
        assert_eq!(sent[0].delivery, Delivery::Send);
        assert_eq!(sent[1].delivery, Delivery::EditLast);
        assert_eq!(sent[1].controls, Some(keyboards::grade_choice()));
    }
}
