use std::path::PathBuf;

/// Core error type for the domain watch bot.
///
/// Adapter crates map their specific errors into this type so the core can
/// decide whether a failure becomes operator-visible text or a log line.
/// Only `Config` is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("domain store unavailable: {path}: {source}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("remote call failed: {0}")]
    RemoteCall(String),

    #[error("unparseable response: {0}")]
    ResponseParse(String),

    #[error("transport error: {0}")]
    Transport(String),
}

impl Error {
    pub fn store(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::StoreUnavailable {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
