use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Settings shared by both adapters. Anything that changes query semantics
/// lives here so the relational and document builders read the same values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct QueryConfig {
    /// Per-call deadline. A call exceeding it is recorded as a timeout.
    #[serde(with = "humantime_serde", default = "QueryConfig::default_timeout")]
    pub timeout: Duration,
    /// Minimum number of ratings a movie needs to appear in top-rated results.
    #[serde(default = "QueryConfig::default_min_support")]
    pub min_support: u32,
    /// Exponential decay per day applied to trending activity.
    #[serde(default = "QueryConfig::default_trending_decay")]
    pub trending_decay: f64,
}

impl QueryConfig {
    fn default_timeout() -> Duration {
        Duration::from_secs(5)
    }

    fn default_min_support() -> u32 {
        5
    }

    fn default_trending_decay() -> f64 {
        0.1
    }
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            timeout: Self::default_timeout(),
            min_support: Self::default_min_support(),
            trending_decay: Self::default_trending_decay(),
        }
    }
}
