use std::sync::Arc;

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};
use tokio::sync::Mutex;
use tracing::info;

use tgf_core::{
    config::Config,
    planner::PlannerSettings,
    ports::{ChatPlatform, Classifier},
};

use crate::handlers;

pub struct AppState {
    pub cfg: Arc<Config>,
    pub settings: PlannerSettings,
    pub platform: Arc<dyn ChatPlatform>,
    pub classifier: Arc<dyn Classifier>,
    /// Held for the duration of an organization run; the account is a single-owner resource.
    pub run_lock: Mutex<()>,
}

impl AppState {
    pub fn new(
        cfg: Arc<Config>,
        platform: Arc<dyn ChatPlatform>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        Self {
            settings: cfg.planner_settings(),
            cfg,
            platform,
            classifier,
            run_lock: Mutex::new(()),
        }
    }
}

pub async fn run_polling(
    cfg: Arc<Config>,
    platform: Arc<dyn ChatPlatform>,
    classifier: Arc<dyn Classifier>,
) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    if let Ok(me) = bot.get_me().await {
        info!(username = %me.username(), "bot started");
    }
    info!(
        allowed_users = cfg.telegram_allowed_users.len(),
        "use /get in a private chat to start organizing"
    );

    let state = Arc::new(AppState::new(cfg, platform, classifier));

    let handler = dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    Ok(())
}
