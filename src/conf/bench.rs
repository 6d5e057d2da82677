use serde::{Deserialize, Serialize};

use crate::core::BackendTag;

/// Which backend runs first. Held fixed for a whole run so warm-cache effects
/// bias every run the same way.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionOrder {
    #[default]
    SqlFirst,
    NosqlFirst,
}

impl ExecutionOrder {
    pub fn tags(&self) -> [BackendTag; 2] {
        match self {
            ExecutionOrder::SqlFirst => [BackendTag::Sql, BackendTag::Nosql],
            ExecutionOrder::NosqlFirst => [BackendTag::Nosql, BackendTag::Sql],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct BenchConfig {
    #[serde(default = "BenchConfig::default_iterations")]
    pub default_iterations: u32,
    #[serde(default = "BenchConfig::default_max_iterations")]
    pub max_iterations: u32,
    /// Executed and discarded per backend before measured iterations start.
    #[serde(default)]
    pub warmup_iterations: u32,
    /// Durations closer than this are reported as indistinguishable.
    #[serde(default = "BenchConfig::default_epsilon_ms")]
    pub epsilon_ms: f64,
    #[serde(default)]
    pub order: ExecutionOrder,
}

impl BenchConfig {
    fn default_iterations() -> u32 {
        10
    }

    fn default_max_iterations() -> u32 {
        1000
    }

    fn default_epsilon_ms() -> f64 {
        0.01
    }
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            default_iterations: Self::default_iterations(),
            max_iterations: Self::default_max_iterations(),
            warmup_iterations: 0,
            epsilon_ms: Self::default_epsilon_ms(),
            order: ExecutionOrder::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_tags() {
        assert_eq!(
            ExecutionOrder::SqlFirst.tags(),
            [BackendTag::Sql, BackendTag::Nosql]
        );
        assert_eq!(
            ExecutionOrder::NosqlFirst.tags(),
            [BackendTag::Nosql, BackendTag::Sql]
        );
    }
}
