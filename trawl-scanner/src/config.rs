use crate::error::ConfigError;
use crate::scope;
use serde::Serialize;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_WORKERS: usize = 20;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
/// Upper bound on `workers`; the permit pool cannot hold more.
pub const MAX_WORKERS: usize = Semaphore::MAX_PERMITS;

/// Parameters for a single crawl run.
#[derive(Debug, Clone, Serialize)]
pub struct CrawlConfig {
    pub seed: Url,
    pub max_depth: usize,
    pub workers: usize,
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
}

impl CrawlConfig {
    /// Parse and validate `seed`, filling in defaults for everything else.
    pub fn new(seed: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            seed: scope::normalize(seed)?,
            max_depth: DEFAULT_MAX_DEPTH,
            workers: DEFAULT_WORKERS,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 || self.workers > MAX_WORKERS {
            return Err(ConfigError::InvalidWorkerCount);
        }
        if self.timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout);
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::Serializer;
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_f64(d.as_secs_f64())
    }
}
