//! Telegram update handlers.
//!
//! The teloxide endpoints only pull ids and text out of the update; the
//! command and callback logic works on core types so it can run against a
//! fake messenger in tests.

use std::sync::Arc;

use teloxide::{
    prelude::*,
    types::{CallbackQuery, Message},
};

use usdrub_core::{
    domain::{ChatId, MessageId, MessageRef, Side},
    messaging::types::{InlineButton, InlineKeyboard},
};

use crate::router::AppState;

mod callback;
mod commands;

pub use callback::CallbackAction;

/// Where a reply goes. `reply_to` is set only outside private chats.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChatContext {
    pub chat_id: ChatId,
    pub reply_to: Option<MessageId>,
}

impl ChatContext {
    pub fn new(chat_id: ChatId, message_id: MessageId, private: bool) -> Self {
        Self {
            chat_id,
            reply_to: (!private).then_some(message_id),
        }
    }
}

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    if !text.starts_with('/') {
        return Ok(());
    }

    let ctx = ChatContext::new(
        ChatId(msg.chat.id.0),
        MessageId(msg.id.0),
        msg.chat.is_private(),
    );
    commands::handle_command(&state, ctx, text).await;
    Ok(())
}

pub async fn handle_callback(q: CallbackQuery, state: Arc<AppState>) -> ResponseResult<()> {
    let message = q.message.as_ref().map(|m| MessageRef {
        chat_id: ChatId(m.chat.id.0),
        message_id: MessageId(m.id.0),
    });
    let data = q.data.as_deref().unwrap_or_default();

    callback::handle_callback(&state, &q.id, message, data).await;
    Ok(())
}

/// Buttons under the summary.
pub fn main_keyboard() -> InlineKeyboard {
    InlineKeyboard::single_row(vec![
        InlineButton::new(Side::Buy.title(), CallbackAction::first(Side::Buy).data()),
        InlineButton::new(Side::Sell.title(), CallbackAction::first(Side::Sell).data()),
        InlineButton::new("Help", CallbackAction::Help.data()),
    ])
}

/// `Next` while more pages remain, nothing otherwise.
pub fn page_keyboard(side: Side, has_more: bool) -> InlineKeyboard {
    if !has_more {
        return InlineKeyboard::default();
    }
    InlineKeyboard::single_row(vec![InlineButton::new(
        "Next",
        CallbackAction::next(side).data(),
    )])
}
