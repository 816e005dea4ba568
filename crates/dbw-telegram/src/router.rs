use std::{sync::Arc, time::Duration};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use dbw_core::{
    checker::{BatchChecker, StatusApi},
    config::Config,
    cycle::CheckCycle,
    dispatcher::CommandDispatcher,
    domain::ChatId,
    messaging::{
        port::MessagingPort,
        throttled::{ThrottleConfig, ThrottledMessenger},
    },
    scheduler::CheckScheduler,
    store::{DomainStore, FileDomainStore},
};

use crate::handlers;
use crate::TelegramMessenger;

#[derive(Clone)]
pub struct AppState {
    pub dispatcher: Arc<CommandDispatcher>,
}

pub async fn run_polling(cfg: Arc<Config>, status_api: Arc<dyn StatusApi>) -> anyhow::Result<()> {
    let bot = Bot::new(cfg.telegram_bot_token.clone());

    // Basic startup info.
    match bot.get_me().await {
        Ok(me) => tracing::info!("dbw started: @{}", me.username()),
        Err(e) => tracing::warn!("getMe failed: {e}"),
    }
    tracing::info!(
        operator = cfg.operator_chat_id.0,
        domains_file = %cfg.domains_file.display(),
        interval_secs = cfg.check_interval.as_secs(),
        batch_size = cfg.batch_size,
        "configuration loaded"
    );

    // The store expects its file to exist; creating it is our job, not the store's.
    if let Err(e) = FileDomainStore::ensure_exists(&cfg.domains_file).await {
        tracing::error!("could not create domain list file: {e}");
    }
    let store: Arc<dyn DomainStore> = Arc::new(FileDomainStore::new(cfg.domains_file.clone()));

    // Reports can span several messages; space them out to stay under flood limits.
    let raw_messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(
        bot.clone(),
        cfg.telegram_message_limit,
    ));
    let messenger: Arc<dyn MessagingPort> = Arc::new(ThrottledMessenger::new(
        raw_messenger,
        ThrottleConfig::default(),
    ));

    let cycle = Arc::new(CheckCycle::new(
        store.clone(),
        BatchChecker::new(status_api, cfg.batch_size),
        messenger.clone(),
        cfg.operator_chat_id,
        cfg.telegram_safe_limit,
    ));

    let scheduler = CheckScheduler::new(cycle.clone(), cfg.check_interval);
    let scheduler_task = scheduler.start();

    {
        let store = store.clone();
        let messenger = messenger.clone();
        let operator = cfg.operator_chat_id;
        let interval = cfg.check_interval;
        tokio::spawn(async move {
            send_startup_notification(store, messenger, operator, interval).await;
        });
    }

    let dispatcher = Arc::new(CommandDispatcher::new(
        cfg.operator_chat_id,
        store,
        cycle,
        messenger,
        cfg.telegram_safe_limit,
        cfg.check_interval,
    ));

    let state = Arc::new(AppState { dispatcher });

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .build()
        .dispatch()
        .await;

    scheduler.stop();
    if let Err(e) = scheduler_task.await {
        tracing::warn!("scheduler task ended abnormally: {e}");
    }

    Ok(())
}

async fn send_startup_notification(
    store: Arc<dyn DomainStore>,
    messenger: Arc<dyn MessagingPort>,
    operator: ChatId,
    interval: Duration,
) {
    let count = match store.read_all().await {
        Ok(domains) => domains.len().to_string(),
        Err(e) => {
            tracing::warn!("startup notification: {e}");
            "?".to_string()
        }
    };
    let text = startup_text(&count, interval);
    if let Err(e) = messenger.send_html(operator, &text).await {
        tracing::warn!("startup notification failed: {e}");
    }
}

fn startup_text(count: &str, interval: Duration) -> String {
    let minutes = (interval.as_secs() / 60).max(1);
    format!(
        "🤖 <b>Domain watch started</b>\nMonitoring {count} domain(s), checking every {minutes} min.\nSend /checknow for an immediate report."
    )
}
