//! Single-shot comparison: one measured call per backend and a verdict.

mod verdict;

use std::sync::Arc;

use log::info;
use serde::Serialize;

use crate::backend::Backends;
use crate::conf::ExecutionOrder;
use crate::core::{BackendTag, ErrorKind, NormalizationError};
use crate::query::{QueryDescriptor, ResultRow};
use crate::timing::{Clock, Measurement, TimingSample, measure};

pub use verdict::Verdict;

/// One backend's side of a comparison. `row_count` and `rows` are absent
/// when the call failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BackendOutcome {
    pub time_ms: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rows: Option<Vec<ResultRow>>,
    pub query: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl BackendOutcome {
    fn new(measurement: Measurement, query: String) -> Self {
        Self {
            time_ms: measurement.sample.duration_ms,
            row_count: measurement.rows.as_ref().map(Vec::len),
            rows: measurement.rows,
            query,
            error_kind: measurement.sample.error_kind,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    #[serde(flatten)]
    pub verdict: Verdict,
    pub analysis: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub sql: BackendOutcome,
    pub nosql: BackendOutcome,
    pub comparison: Comparison,
}

pub struct Comparator {
    backends: Backends,
    clock: Arc<dyn Clock>,
    order: ExecutionOrder,
    epsilon_ms: f64,
}

impl Comparator {
    pub fn new(
        backends: Backends,
        clock: Arc<dyn Clock>,
        order: ExecutionOrder,
        epsilon_ms: f64,
    ) -> Self {
        Self {
            backends,
            clock,
            order,
            epsilon_ms,
        }
    }

    /// Runs the descriptor once per backend, strictly one after the other in
    /// the configured order.
    pub async fn compare(
        &self,
        descriptor: &QueryDescriptor,
    ) -> Result<ComparisonReport, NormalizationError> {
        let [first, second] = self.order.tags();
        let first_outcome = self.run_one(first, descriptor).await?;
        let second_outcome = self.run_one(second, descriptor).await?;

        let (sql, nosql) = match first {
            BackendTag::Sql => (first_outcome, second_outcome),
            BackendTag::Nosql => (second_outcome, first_outcome),
        };

        let verdict = Verdict::from_samples(&sql.0, &nosql.0, self.epsilon_ms);
        let analysis = verdict.analysis();
        info!(kind = descriptor.kind().as_str(); "comparison finished: {analysis}");

        Ok(ComparisonReport {
            sql: sql.1,
            nosql: nosql.1,
            comparison: Comparison { verdict, analysis },
        })
    }

    async fn run_one(
        &self,
        tag: BackendTag,
        descriptor: &QueryDescriptor,
    ) -> Result<(TimingSample, BackendOutcome), NormalizationError> {
        let backend = self.backends.get(tag);
        let query = backend.describe(descriptor);
        let measurement = measure(backend, descriptor, self.clock.as_ref()).await?;
        let sample = measurement.sample.clone();
        Ok((sample, BackendOutcome::new(measurement, query)))
    }
}
