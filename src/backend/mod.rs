//! Backend adapters: one canonical descriptor in, backend-native rows out.
//!
//! Query construction is a pure function per backend (`sql::build`,
//! `document::build`); the adapters only add execution, the per-call
//! deadline and error classification on top.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::Document;
use serde_json::{Map, Value};

use crate::core::{BackendError, BackendTag};
use crate::query::{QueryDescriptor, QueryKind};

pub mod document;
pub mod sql;

pub use document::{DocumentBackend, DocumentExecutor, MongoExecutor, Pipeline};
pub use sql::{PgExecutor, SqlBackend, SqlExecutor, SqlParam, SqlQuery};

/// A relational row as a column-name map.
pub type SqlRow = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Rows(Vec<SqlRow>),
    Documents(Vec<Document>),
}

impl RawPayload {
    pub fn shape(&self) -> &'static str {
        match self {
            RawPayload::Rows(_) => "rows",
            RawPayload::Documents(_) => "documents",
        }
    }
}

/// Backend-native output of one call, tagged with the query kind so the
/// normalizer can pick the field mapping.
#[derive(Debug, Clone, PartialEq)]
pub struct RawResult {
    pub kind: QueryKind,
    pub payload: RawPayload,
}

/// A store that can answer a canonical query.
#[async_trait]
pub trait Backend: Send + Sync {
    fn tag(&self) -> BackendTag;

    /// Native query text for reports (SQL or pipeline JSON).
    fn describe(&self, descriptor: &QueryDescriptor) -> String;

    /// Executes a read-only query. Fails with a connection, query or timeout
    /// error; never panics on backend trouble.
    async fn execute(&self, descriptor: &QueryDescriptor) -> Result<RawResult, BackendError>;
}

/// Runs `fut` under the per-call deadline.
pub(crate) async fn with_deadline<T, F>(deadline: Duration, fut: F) -> Result<T, BackendError>
where
    F: Future<Output = Result<T, BackendError>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(BackendError::Timeout(deadline)),
    }
}

/// The fixed pair of backends. Callers select one explicitly by tag; there is
/// no ambient "current backend".
#[derive(Clone)]
pub struct Backends {
    sql: Arc<dyn Backend>,
    nosql: Arc<dyn Backend>,
}

impl Backends {
    pub fn new(sql: Arc<dyn Backend>, nosql: Arc<dyn Backend>) -> Self {
        debug_assert_eq!(sql.tag(), BackendTag::Sql);
        debug_assert_eq!(nosql.tag(), BackendTag::Nosql);
        Self { sql, nosql }
    }

    pub fn get(&self, tag: BackendTag) -> &dyn Backend {
        match tag {
            BackendTag::Sql => self.sql.as_ref(),
            BackendTag::Nosql => self.nosql.as_ref(),
        }
    }
}
