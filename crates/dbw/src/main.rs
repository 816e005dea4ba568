use std::sync::Arc;

use dbw_checkapi::HttpStatusApi;

use dbw_core::{checker::StatusApi, config::Config};

#[tokio::main]
async fn main() -> Result<(), dbw_core::Error> {
    dbw_core::logging::init("dbw")?;

    let cfg = Arc::new(Config::load()?);

    let status_api: Arc<dyn StatusApi> =
        Arc::new(HttpStatusApi::new(&cfg.check_api_url, cfg.check_timeout)?);

    dbw_telegram::router::run_polling(cfg, status_api)
        .await
        .map_err(|e| dbw_core::Error::Transport(format!("telegram bot failed: {e}")))?;

    Ok(())
}
