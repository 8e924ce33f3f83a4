use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageId, MessageRef},
    messaging::types::InlineKeyboard,
    Result,
};

/// Outbound chat operations the bot needs. All text is Telegram HTML.
///
/// `reply_to` threads the message under the one that triggered it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(
        &self,
        chat_id: ChatId,
        html: &str,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    async fn send_inline_keyboard(
        &self,
        chat_id: ChatId,
        html: &str,
        keyboard: InlineKeyboard,
        reply_to: Option<MessageId>,
    ) -> Result<MessageRef>;

    /// Replace text and keyboard of a sent message. An empty keyboard
    /// removes the buttons.
    async fn edit_inline_keyboard(
        &self,
        msg: MessageRef,
        html: &str,
        keyboard: InlineKeyboard,
    ) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
