use serde::{Deserialize, Serialize};
use serde_with::serde_as;
use std::time::Duration;

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct IndexerSettings {
    /// Transactions of one block range ingested in parallel.
    pub concurrency: usize,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub poll_interval: Duration,
    /// Maximum number of blocks requested per log query.
    pub batch_size: u64,
    #[serde_as(as = "serde_with::DurationSeconds<u64>")]
    pub restart_delay: Duration,
    pub retry: RetrySettings,
}

impl Default for IndexerSettings {
    fn default() -> Self {
        Self {
            concurrency: 10,
            poll_interval: Duration::from_secs(6),
            batch_size: 1000,
            restart_delay: Duration::from_secs(60),
            retry: RetrySettings::default(),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct RetrySettings {
    pub max_attempts: u32,
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub initial_delay: Duration,
    #[serde_as(as = "serde_with::DurationMilliSeconds<u64>")]
    pub max_delay: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}
