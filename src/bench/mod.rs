//! Repeated measurement and latency distributions per backend.

mod stats;

use std::collections::BTreeMap;
use std::sync::Arc;

use log::{debug, info};
use serde::Serialize;

use crate::backend::Backends;
use crate::conf::ExecutionOrder;
use crate::core::{BackendTag, ErrorKind, ReelError, ValidationError};
use crate::query::{QueryDescriptor, QueryKind};
use crate::timing::{Clock, TimingSample, measure};

pub use stats::{LatencyDistribution, compute_percentile};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum LatencyOutcome {
    Measured(LatencyDistribution),
    AllIterationsFailed,
}

impl LatencyOutcome {
    pub fn distribution(&self) -> Option<&LatencyDistribution> {
        match self {
            LatencyOutcome::Measured(d) => Some(d),
            LatencyOutcome::AllIterationsFailed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendStats {
    pub successes: usize,
    pub failures: usize,
    pub failure_kinds: BTreeMap<ErrorKind, usize>,
    #[serde(flatten)]
    pub latency: LatencyOutcome,
}

impl BackendStats {
    fn from_samples(samples: &[TimingSample]) -> Self {
        let mut failure_kinds = BTreeMap::new();
        let mut durations = Vec::with_capacity(samples.len());
        for sample in samples {
            if sample.succeeded {
                durations.push(sample.duration_ms);
            } else if let Some(kind) = sample.error_kind {
                *failure_kinds.entry(kind).or_insert(0) += 1;
            }
        }
        let latency = match LatencyDistribution::from_samples(&durations) {
            Some(d) => LatencyOutcome::Measured(d),
            None => LatencyOutcome::AllIterationsFailed,
        };
        Self {
            successes: durations.len(),
            failures: samples.len() - durations.len(),
            failure_kinds,
            latency,
        }
    }
}

/// Cross-backend summary. Every field is absent when either side has no
/// distribution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchComparison {
    pub sql_faster_on_avg: Option<bool>,
    pub avg_difference_ms: Option<f64>,
    pub sql_more_consistent: Option<bool>,
}

impl BenchComparison {
    fn new(sql: &BackendStats, nosql: &BackendStats) -> Self {
        match (sql.latency.distribution(), nosql.latency.distribution()) {
            (Some(s), Some(n)) => Self {
                sql_faster_on_avg: Some(s.avg < n.avg),
                avg_difference_ms: Some((s.avg - n.avg).abs()),
                sql_more_consistent: Some(s.spread() < n.spread()),
            },
            _ => Self {
                sql_faster_on_avg: None,
                avg_difference_ms: None,
                sql_more_consistent: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BenchmarkReport {
    pub query_type: QueryKind,
    pub iterations: u32,
    pub warmup_iterations: u32,
    pub order: ExecutionOrder,
    pub sql: BackendStats,
    pub nosql: BackendStats,
    pub comparison: BenchComparison,
}

pub struct BenchmarkRunner {
    backends: Backends,
    clock: Arc<dyn Clock>,
    order: ExecutionOrder,
    warmup_iterations: u32,
    max_iterations: u32,
}

impl BenchmarkRunner {
    pub fn new(
        backends: Backends,
        clock: Arc<dyn Clock>,
        order: ExecutionOrder,
        warmup_iterations: u32,
        max_iterations: u32,
    ) -> Self {
        Self {
            backends,
            clock,
            order,
            warmup_iterations,
            max_iterations,
        }
    }

    fn validate_iterations(&self, iterations: i64) -> Result<u32, ValidationError> {
        let invalid = ValidationError::Iterations {
            got: iterations,
            max: self.max_iterations,
        };
        match u32::try_from(iterations) {
            Ok(n) if (1..=self.max_iterations).contains(&n) => Ok(n),
            _ => Err(invalid),
        }
    }

    /// Runs every iteration of the first backend before the second starts.
    /// Backend failures are counted, never raised; a normalization failure
    /// aborts the run.
    pub async fn run(
        &self,
        descriptor: &QueryDescriptor,
        iterations: i64,
    ) -> Result<BenchmarkReport, ReelError> {
        let iterations = self.validate_iterations(iterations)?;
        info!(
            kind = descriptor.kind().as_str(),
            iterations = iterations,
            warmup = self.warmup_iterations;
            "benchmark started"
        );

        let [first, second] = self.order.tags();
        let first_stats = self.run_backend(first, descriptor, iterations).await?;
        let second_stats = self.run_backend(second, descriptor, iterations).await?;
        let (sql, nosql) = match first {
            BackendTag::Sql => (first_stats, second_stats),
            BackendTag::Nosql => (second_stats, first_stats),
        };

        let comparison = BenchComparison::new(&sql, &nosql);
        info!(
            kind = descriptor.kind().as_str(),
            sql_successes = sql.successes,
            nosql_successes = nosql.successes;
            "benchmark finished"
        );
        Ok(BenchmarkReport {
            query_type: descriptor.kind(),
            iterations,
            warmup_iterations: self.warmup_iterations,
            order: self.order,
            sql,
            nosql,
            comparison,
        })
    }

    async fn run_backend(
        &self,
        tag: BackendTag,
        descriptor: &QueryDescriptor,
        iterations: u32,
    ) -> Result<BackendStats, ReelError> {
        let backend = self.backends.get(tag);
        let clock = self.clock.as_ref();

        for _ in 0..self.warmup_iterations {
            measure(backend, descriptor, clock).await?;
        }
        debug!(backend = tag, warmup = self.warmup_iterations; "warmup done");

        let mut samples = Vec::with_capacity(iterations as usize);
        for _ in 0..iterations {
            samples.push(measure(backend, descriptor, clock).await?.sample);
        }
        Ok(BackendStats::from_samples(&samples))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(
        backend: BackendTag,
        duration_ms: f64,
        error_kind: Option<ErrorKind>,
    ) -> TimingSample {
        TimingSample {
            backend,
            duration_ms,
            succeeded: error_kind.is_none(),
            error_kind,
        }
    }

    #[test]
    fn test_stats_count_failures_by_kind() {
        let samples = vec![
            sample(BackendTag::Sql, 10.0, None),
            sample(BackendTag::Sql, 5000.0, Some(ErrorKind::Timeout)),
            sample(BackendTag::Sql, 12.0, None),
            sample(BackendTag::Sql, 1.0, Some(ErrorKind::Connection)),
            sample(BackendTag::Sql, 5000.0, Some(ErrorKind::Timeout)),
        ];
        let stats = BackendStats::from_samples(&samples);
        assert_eq!(stats.successes, 2);
        assert_eq!(stats.failures, 3);
        assert_eq!(stats.failure_kinds[&ErrorKind::Timeout], 2);
        assert_eq!(stats.failure_kinds[&ErrorKind::Connection], 1);
        let d = stats.latency.distribution().unwrap();
        assert_eq!(d.min, 10.0);
        assert_eq!(d.max, 12.0);
    }

    #[test]
    fn test_all_failed_serializes_status() {
        let stats =
            BackendStats::from_samples(&[sample(BackendTag::Nosql, 1.0, Some(ErrorKind::Query))]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["status"], "all_iterations_failed");
        assert_eq!(json["failure_kinds"]["query"], 1);
        assert!(json.get("avg").is_none());
    }

    #[test]
    fn test_measured_flattens_distribution() {
        let stats = BackendStats::from_samples(&[sample(BackendTag::Sql, 4.0, None)]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["status"], "measured");
        assert_eq!(json["p99"], 4.0);
    }

    #[test]
    fn test_comparison_absent_without_both_distributions() {
        let ok = BackendStats::from_samples(&[sample(BackendTag::Sql, 4.0, None)]);
        let failed =
            BackendStats::from_samples(&[sample(BackendTag::Nosql, 4.0, Some(ErrorKind::Timeout))]);
        let cmp = BenchComparison::new(&ok, &failed);
        assert_eq!(cmp.sql_faster_on_avg, None);
        assert_eq!(cmp.avg_difference_ms, None);
        assert_eq!(cmp.sql_more_consistent, None);
    }

    #[test]
    fn test_comparison_spread() {
        let sql = BackendStats::from_samples(&[
            sample(BackendTag::Sql, 10.0, None),
            sample(BackendTag::Sql, 11.0, None),
        ]);
        let nosql = BackendStats::from_samples(&[
            sample(BackendTag::Nosql, 5.0, None),
            sample(BackendTag::Nosql, 15.0, None),
        ]);
        let cmp = BenchComparison::new(&sql, &nosql);
        assert_eq!(cmp.sql_faster_on_avg, Some(false));
        assert_eq!(cmp.avg_difference_ms, Some(0.5));
        assert_eq!(cmp.sql_more_consistent, Some(true));
    }
}
