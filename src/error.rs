use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by selectors, scanners and configuration loading.
#[derive(Debug, Error)]
pub enum Error {
    /// A capacity, limit or tuning knob was out of range.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Two selectors with different capacity or comparator were merged.
    #[error("Cannot merge selectors: {reason}")]
    IncompatibleMerge { reason: String },

    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config at {}: {source}", .path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config at {}: {source}", .path.display())]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

pub type Result<T> = std::result::Result<T, Error>;
