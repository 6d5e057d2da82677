//! Entry points for comparisons, benchmarks and single-backend queries.

use std::sync::Arc;

use log::info;

use crate::backend::{Backends, DocumentBackend, MongoExecutor, PgExecutor, SqlBackend};
use crate::bench::{BenchmarkReport, BenchmarkRunner};
use crate::compare::{Comparator, ComparisonReport};
use crate::conf::Config;
use crate::core::{BackendTag, ReelError};
use crate::normalize::normalize;
use crate::query::{Filters, QueryDescriptor, QueryKind, QueryParams, ResultRow};
use crate::timing::{Clock, MonotonicClock};

pub struct CompareService {
    backends: Backends,
    comparator: Comparator,
    runner: BenchmarkRunner,
    config: Config,
}

impl CompareService {
    pub fn new(config: Config, backends: Backends) -> Self {
        Self::with_clock(config, backends, Arc::new(MonotonicClock::new()))
    }

    pub fn with_clock(config: Config, backends: Backends, clock: Arc<dyn Clock>) -> Self {
        let bench = &config.bench;
        let comparator =
            Comparator::new(backends.clone(), clock.clone(), bench.order, bench.epsilon_ms);
        let runner = BenchmarkRunner::new(
            backends.clone(),
            clock,
            bench.order,
            bench.warmup_iterations,
            bench.max_iterations,
        );
        Self {
            backends,
            comparator,
            runner,
            config,
        }
    }

    /// Builds both production adapters. The relational pool connects lazily;
    /// the document client resolves its seed list up front.
    pub async fn connect(config: Config) -> Result<Self, ReelError> {
        let pg = PgExecutor::connect_lazy(&config.postgres)?;
        let mongo = MongoExecutor::connect(&config.mongo).await?;
        info!(
            "backends ready: postgres max_connections={}, mongo database '{}'",
            config.postgres.max_connections, config.mongo.database
        );
        let backends = Backends::new(
            Arc::new(SqlBackend::new(pg, config.query.clone())),
            Arc::new(DocumentBackend::new(mongo, config.query.clone())),
        );
        Ok(Self::new(config, backends))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn compare(
        &self,
        descriptor: &QueryDescriptor,
    ) -> Result<ComparisonReport, ReelError> {
        Ok(self.comparator.compare(descriptor).await?)
    }

    pub async fn compare_top_movies(
        &self,
        limit: i64,
        window_days: Option<i64>,
    ) -> Result<ComparisonReport, ReelError> {
        let params = QueryParams {
            limit: Some(limit),
            days: window_days,
            ..QueryParams::default()
        };
        self.compare(&params.into_descriptor(QueryKind::TopRatedMovies)?).await
    }

    pub async fn compare_trending(
        &self,
        limit: i64,
        window_days: Option<i64>,
    ) -> Result<ComparisonReport, ReelError> {
        let params = QueryParams {
            limit: Some(limit),
            days: window_days,
            ..QueryParams::default()
        };
        self.compare(&params.into_descriptor(QueryKind::TrendingMovies)?).await
    }

    /// `window_days` narrows which ratings are counted, not which movies match.
    pub async fn compare_search(
        &self,
        filters: Filters,
        limit: i64,
        window_days: Option<i64>,
    ) -> Result<ComparisonReport, ReelError> {
        let mut descriptor =
            QueryDescriptor::new(QueryKind::SearchMovies, limit)?.with_filters(filters)?;
        if let Some(days) = window_days {
            descriptor = descriptor.with_window_days(days)?;
        }
        self.compare(&descriptor).await
    }

    /// `iterations` falls back to the configured default when absent.
    pub async fn run_benchmark(
        &self,
        query_type: &str,
        iterations: Option<i64>,
        params: QueryParams,
    ) -> Result<BenchmarkReport, ReelError> {
        let kind: QueryKind = query_type.parse()?;
        let descriptor = params.into_descriptor(kind)?;
        let iterations =
            iterations.unwrap_or_else(|| i64::from(self.config.bench.default_iterations));
        self.runner.run(&descriptor, iterations).await
    }

    /// Runs against one explicitly chosen backend, without timing.
    pub async fn query(
        &self,
        tag: BackendTag,
        descriptor: &QueryDescriptor,
    ) -> Result<Vec<ResultRow>, ReelError> {
        let raw = self.backends.get(tag).execute(descriptor).await?;
        Ok(normalize(tag, raw)?)
    }
}
