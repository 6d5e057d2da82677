mod executor;
mod query;

use async_trait::async_trait;
use log::debug;

use crate::backend::{Backend, RawPayload, RawResult, with_deadline};
use crate::conf::QueryConfig;
use crate::core::{BackendError, BackendTag};
use crate::query::QueryDescriptor;

pub use executor::{PgExecutor, SqlExecutor};
pub use query::{SqlParam, SqlQuery, build};

/// Relational adapter: SQL joins and aggregations over the normalized schema.
pub struct SqlBackend<E> {
    executor: E,
    settings: QueryConfig,
}

impl<E: SqlExecutor> SqlBackend<E> {
    pub fn new(executor: E, settings: QueryConfig) -> Self {
        Self { executor, settings }
    }
}

#[async_trait]
impl<E: SqlExecutor> Backend for SqlBackend<E> {
    fn tag(&self) -> BackendTag {
        BackendTag::Sql
    }

    fn describe(&self, descriptor: &QueryDescriptor) -> String {
        build(descriptor, &self.settings).text
    }

    async fn execute(&self, descriptor: &QueryDescriptor) -> Result<RawResult, BackendError> {
        let query = build(descriptor, &self.settings);
        debug!("sql {}: {} params", descriptor.kind(), query.params.len());
        let rows = with_deadline(self.settings.timeout, self.executor.fetch(&query)).await?;
        Ok(RawResult {
            kind: descriptor.kind(),
            payload: RawPayload::Rows(rows),
        })
    }
}
