use thiserror::Error;

/// Invalid crawl configuration. Reported before any request is made.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Unsupported scheme '{0}' (only http and https can be crawled)")]
    UnsupportedScheme(String),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("Worker count must be between 1 and {max}", max = tokio::sync::Semaphore::MAX_PERMITS)]
    InvalidWorkerCount,

    #[error("Fetch timeout must be greater than zero")]
    InvalidTimeout,
}

#[derive(Error, Debug)]
pub enum CrawlError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Worker task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, CrawlError>;
