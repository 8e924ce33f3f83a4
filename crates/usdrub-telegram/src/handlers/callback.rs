use tracing::{debug, warn};

use usdrub_core::{
    cursor::PageRequest,
    domain::{MessageRef, Side},
    formatting::{page_html, HELP_TEXT},
};

use crate::router::AppState;

use super::page_keyboard;

/// Button payloads: `buy`, `sell`, `buy:next`, `sell:next`, `help`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CallbackAction {
    Page(Side, PageRequest),
    Help,
}

impl CallbackAction {
    pub fn first(side: Side) -> Self {
        Self::Page(side, PageRequest::First)
    }

    pub fn next(side: Side) -> Self {
        Self::Page(side, PageRequest::Next)
    }

    pub fn parse(data: &str) -> Option<Self> {
        if data == "help" {
            return Some(Self::Help);
        }

        let (side, rest) = match data.split_once(':') {
            Some((side, rest)) => (side, Some(rest)),
            None => (data, None),
        };
        let side = match side {
            "buy" => Side::Buy,
            "sell" => Side::Sell,
            _ => return None,
        };
        match rest {
            None => Some(Self::first(side)),
            Some("next") => Some(Self::next(side)),
            Some(_) => None,
        }
    }

    pub fn data(self) -> String {
        match self {
            Self::Help => "help".to_string(),
            Self::Page(side, PageRequest::First) => side.as_str().to_string(),
            Self::Page(side, PageRequest::Next) => format!("{}:next", side.as_str()),
        }
    }
}

/// Page buttons open page 0 in a new message and `Next` edits that message
/// in place. The query is always answered so the client stops its spinner.
pub async fn handle_callback(
    state: &AppState,
    callback_id: &str,
    message: Option<MessageRef>,
    data: &str,
) {
    let action = CallbackAction::parse(data);
    let answer = match (action, message) {
        (None, _) => Some("Unknown action"),
        (Some(_), None) => Some("This message is too old, send /cash again"),
        (Some(action), Some(msg)) => {
            if let Err(e) = run_action(state, action, msg).await {
                warn!(error = %e, data, "callback action failed");
            }
            None
        }
    };

    if let Err(e) = state
        .messenger
        .answer_callback_query(callback_id, answer)
        .await
    {
        debug!(error = %e, "answering callback query failed");
    }
}

async fn run_action(
    state: &AppState,
    action: CallbackAction,
    msg: MessageRef,
) -> usdrub_core::Result<()> {
    match action {
        CallbackAction::Help => {
            state.messenger.send_html(msg.chat_id, HELP_TEXT, None).await?;
        }
        CallbackAction::Page(side, request) => {
            let view = state.store.page(msg.chat_id, side, request).await;
            let html = page_html(side, &view);
            let keyboard = page_keyboard(side, view.has_more);

            match request {
                PageRequest::First => {
                    state
                        .messenger
                        .send_inline_keyboard(msg.chat_id, &html, keyboard, None)
                        .await?;
                }
                PageRequest::Next => {
                    state
                        .messenger
                        .edit_inline_keyboard(msg, &html, keyboard)
                        .await?;
                }
            }
        }
    }
    Ok(())
}
