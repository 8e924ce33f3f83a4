use tracing::{debug, warn};

use usdrub_core::formatting::{summary_html, HELP_TEXT};

use crate::router::AppState;

use super::{main_keyboard, ChatContext};

/// Command name without the slash or a `@botname` suffix, lowercased.
fn parse_command(text: &str) -> String {
    let first = text.split_whitespace().next().unwrap_or("");

    first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase()
}

pub async fn handle_command(state: &AppState, ctx: ChatContext, text: &str) {
    let cmd = parse_command(text);
    debug!(chat_id = ctx.chat_id.0, %cmd, "command received");

    let result = match cmd.as_str() {
        "start" | "dashboard" | "cash" => send_summary(state, ctx).await,
        "help" => state
            .messenger
            .send_html(ctx.chat_id, HELP_TEXT, ctx.reply_to)
            .await
            .map(|_| ()),
        _ => state
            .messenger
            .send_html(ctx.chat_id, "Unknown command. Try /help", ctx.reply_to)
            .await
            .map(|_| ()),
    };

    if let Err(e) = result {
        warn!(error = %e, %cmd, "command reply failed");
    }
}

async fn send_summary(state: &AppState, ctx: ChatContext) -> usdrub_core::Result<()> {
    let snapshot = state.store.read().await;
    let html = summary_html(
        state.store.region(),
        &snapshot.summary_text(),
        snapshot.refreshed_at,
    );

    state
        .messenger
        .send_inline_keyboard(ctx.chat_id, &html, main_keyboard(), ctx.reply_to)
        .await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use usdrub_core::{
        domain::{ChatId, MessageId},
        store::UNAVAILABLE_TEXT,
    };

    use super::*;
    use crate::handlers::testing::{state, Sent};

    #[test]
    fn parses_command_names() {
        assert_eq!(parse_command("/cash"), "cash");
        assert_eq!(parse_command("/Cash@usdrub_bot extra args"), "cash");
        assert_eq!(parse_command("  /help  "), "help");
        assert_eq!(parse_command("/"), "");
    }

    #[tokio::test]
    async fn cash_sends_summary_with_keyboard_in_group() {
        let (state, messenger) = state(Some("A;79;81\nB;80;80,5"), 10).await;
        let ctx = ChatContext::new(ChatId(-100), MessageId(3), false);

        handle_command(&state, ctx, "/cash").await;

        let sent = messenger.take();
        let Sent::Keyboard {
            chat_id,
            html,
            keyboard,
            reply_to,
        } = &sent[0]
        else {
            panic!("expected a keyboard message, got {sent:?}");
        };
        assert_eq!(*chat_id, ChatId(-100));
        assert_eq!(*reply_to, Some(MessageId(3)));
        assert!(html.contains("Buy:  80.00 .. 79.00 RUB (avg 79.50)"));
        assert!(html.contains("Sell: 80.50 .. 81.00 RUB (avg 80.75)"));
        assert!(html.contains("Refreshed"));
        assert_eq!(keyboard.buttons().count(), 3);
    }

    #[tokio::test]
    async fn unavailable_rates_mention_the_failure() {
        let (state, messenger) = state(None, 10).await;
        let ctx = ChatContext::new(ChatId(1), MessageId(1), true);

        handle_command(&state, ctx, "/start").await;

        let sent = messenger.take();
        let Sent::Keyboard { html, reply_to, .. } = &sent[0] else {
            panic!("expected a keyboard message, got {sent:?}");
        };
        assert_eq!(*reply_to, None);
        assert!(html.contains(UNAVAILABLE_TEXT));
        assert!(html.contains("no route to host"));
        assert!(!html.contains("0.00"));
    }

    #[tokio::test]
    async fn help_and_unknown_commands() {
        let (state, messenger) = state(None, 10).await;
        let ctx = ChatContext::new(ChatId(1), MessageId(1), true);

        handle_command(&state, ctx, "/help").await;
        handle_command(&state, ctx, "/forex").await;

        let sent = messenger.take();
        assert_eq!(
            sent,
            vec![
                Sent::Html {
                    chat_id: ChatId(1),
                    html: HELP_TEXT.to_string(),
                    reply_to: None
                },
                Sent::Html {
                    chat_id: ChatId(1),
                    html: "Unknown command. Try /help".to_string(),
                    reply_to: None
                },
            ]
        );
    }
}
