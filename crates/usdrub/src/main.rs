use std::sync::Arc;

use usdrub_core::{config::Config, store::RateStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = Arc::new(Config::load()?);
    usdrub_core::logging::init("usdrub", cfg.debug)?;

    let store = Arc::new(RateStore::from_config(&cfg)?);
    tracing::info!(
        region = %store.region(),
        cron = %cfg.cron_spec,
        "starting USD/RUB cash rates bot"
    );

    usdrub_telegram::router::run_polling(cfg, store).await
}
