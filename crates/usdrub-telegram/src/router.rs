use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*, types::BotCommand};
use tracing::{info, warn};

use usdrub_core::{
    config::Config, messaging::port::MessagingPort, scheduler::RefreshScheduler, store::RateStore,
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<RateStore>,
    pub messenger: Arc<dyn MessagingPort>,
}

fn bot_commands() -> Vec<BotCommand> {
    vec![
        BotCommand::new("cash", "USD/RUB cash rates summary"),
        BotCommand::new("dashboard", "Same as /cash"),
        BotCommand::new("help", "How to use the bot"),
    ]
}

/// Start the refresh scheduler and serve updates until Ctrl-C.
pub async fn run_polling(cfg: Arc<Config>, store: Arc<RateStore>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.require_bot_token()?);

    match bot.get_me().await {
        Ok(me) => info!(username = %me.username(), region = %store.region(), "bot started"),
        Err(e) => warn!(error = %e, "could not fetch bot identity"),
    }
    if let Err(e) = bot.set_my_commands(bot_commands()).await {
        warn!(error = %e, "could not register bot commands");
    }

    let scheduler = RefreshScheduler::from_config(store.clone(), &cfg)?;
    scheduler.start().await;

    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let state = Arc::new(AppState { store, messenger });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    scheduler.stop().await;
    Ok(())
}
