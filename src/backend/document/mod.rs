mod executor;
mod pipeline;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;

use crate::backend::{Backend, RawPayload, RawResult, with_deadline};
use crate::conf::QueryConfig;
use crate::core::{BackendError, BackendTag};
use crate::query::QueryDescriptor;

pub use executor::{DocumentExecutor, MongoExecutor};
pub use pipeline::{Pipeline, build};

/// Document adapter: aggregation pipelines over the `movies`, `ratings` and
/// `events` collections.
pub struct DocumentBackend<E> {
    executor: E,
    settings: QueryConfig,
}

impl<E: DocumentExecutor> DocumentBackend<E> {
    pub fn new(executor: E, settings: QueryConfig) -> Self {
        Self { executor, settings }
    }
}

#[async_trait]
impl<E: DocumentExecutor> Backend for DocumentBackend<E> {
    fn tag(&self) -> BackendTag {
        BackendTag::Nosql
    }

    fn describe(&self, descriptor: &QueryDescriptor) -> String {
        build(descriptor, &self.settings, Utc::now()).to_shell()
    }

    async fn execute(&self, descriptor: &QueryDescriptor) -> Result<RawResult, BackendError> {
        let pipeline = build(descriptor, &self.settings, Utc::now());
        debug!(
            "nosql {}: {} stages on '{}'",
            descriptor.kind(),
            pipeline.stages.len(),
            pipeline.collection
        );
        let docs = with_deadline(self.settings.timeout, self.executor.aggregate(&pipeline)).await?;
        Ok(RawResult {
            kind: descriptor.kind(),
            payload: RawPayload::Documents(docs),
        })
    }
}
