use std::{
    env, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::{domain::ChatId, errors::Error, Result};

pub const DEFAULT_DOMAINS_FILE: &str = "data/domains.txt";
pub const DEFAULT_CHECK_API_URL: &str = "https://check.skiddle.id/";
/// The status API accepts at most this many domains per request.
pub const MAX_BATCH_SIZE: usize = 30;
/// Floor for both Telegram length settings, in UTF-16 code units.
pub const MIN_MESSAGE_LIMIT: usize = 200;

/// Typed configuration, loaded once at process start.
#[derive(Clone, Debug)]
pub struct Config {
    // Core
    pub telegram_bot_token: String,
    pub operator_chat_id: ChatId,
    pub domains_file: PathBuf,

    // Status API
    pub check_api_url: String,
    pub check_timeout: Duration,
    pub batch_size: usize,
    pub check_interval: Duration,

    // Telegram limits
    pub telegram_message_limit: usize,
    pub telegram_safe_limit: usize,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let env_str = |key: &str| lookup(key).and_then(non_empty);
        let env_u64 = |key: &str| env_str(key).and_then(|s| s.trim().parse::<u64>().ok());
        let env_usize = |key: &str| env_str(key).and_then(|s| s.trim().parse::<usize>().ok());

        // Required env vars
        let Some(telegram_bot_token) = env_str("TELEGRAM_BOT_TOKEN") else {
            return Err(Error::Config(
                "TELEGRAM_BOT_TOKEN environment variable is required".to_string(),
            ));
        };
        let Some(raw_operator) = env_str("TELEGRAM_OPERATOR_ID") else {
            return Err(Error::Config(
                "TELEGRAM_OPERATOR_ID environment variable is required".to_string(),
            ));
        };
        let operator_chat_id = raw_operator.trim().parse::<i64>().map(ChatId).map_err(|_| {
            Error::Config(format!(
                "TELEGRAM_OPERATOR_ID must be a numeric chat id, got {raw_operator:?}"
            ))
        })?;

        let domains_file = PathBuf::from(
            env_str("DOMAINS_FILE").unwrap_or_else(|| DEFAULT_DOMAINS_FILE.to_string()),
        );

        // Status API
        let check_api_url =
            env_str("CHECK_API_URL").unwrap_or_else(|| DEFAULT_CHECK_API_URL.to_string());
        let check_timeout =
            Duration::from_secs(env_u64("CHECK_TIMEOUT_SECS").unwrap_or(20).clamp(15, 30));
        let batch_size = env_usize("CHECK_BATCH_SIZE")
            .unwrap_or(MAX_BATCH_SIZE)
            .clamp(1, MAX_BATCH_SIZE);
        let check_interval =
            Duration::from_secs(env_u64("CHECK_INTERVAL_SECS").unwrap_or(30 * 60).max(60));

        // Telegram message limits
        let telegram_message_limit = env_usize("TELEGRAM_MESSAGE_LIMIT")
            .unwrap_or(4096)
            .max(MIN_MESSAGE_LIMIT);
        let telegram_safe_limit = env_usize("TELEGRAM_SAFE_LIMIT")
            .unwrap_or(4000)
            .max(MIN_MESSAGE_LIMIT)
            .min(telegram_message_limit);

        Ok(Self {
            telegram_bot_token,
            operator_chat_id,
            domains_file,
            check_api_url,
            check_timeout,
            batch_size,
            check_interval,
            telegram_message_limit,
            telegram_safe_limit,
        })
    }
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        env::set_var(key, strip_quotes(v.trim()));
    }
}

fn strip_quotes(val: &str) -> &str {
    if val.len() >= 2
        && ((val.starts_with('"') && val.ends_with('"'))
            || (val.starts_with('\'') && val.ends_with('\'')))
    {
        return &val[1..val.len() - 1];
    }
    val
}

fn non_empty(s: String) -> Option<String> {
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}
