//! Conversation core: the per-user flow from phone number to career result.
//!
//! `machine` holds the transition rules, `service` serializes them against
//! the user store, and the remaining modules are the pieces they share.

pub mod events;
pub mod keyboards;
pub mod machine;
pub mod messages;
pub mod recommend;
pub mod service;
pub mod validation;

#[cfg(test)]
pub mod fixtures;

use crate::conversation::keyboards::Controls;

/// How an outbound message reaches the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// A new message.
    Send,
    /// Replace the bot's last message (the one whose button was pressed).
    EditLast,
}

/// One outbound message produced by handling an inbound event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub delivery: Delivery,
    pub text: String,
    pub controls: Option<Controls>,
}

impl Reply {
    pub fn send(text: impl Into<String>, controls: Option<Controls>) -> Self {
        Self {
            delivery: Delivery::Send,
            text: text.into(),
            controls,
        }
    }

    pub fn edit(text: impl Into<String>, controls: Option<Controls>) -> Self {
        Self {
            delivery: Delivery::EditLast,
            text: text.into(),
            controls,
        }
    }
}
