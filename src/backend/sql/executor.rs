use async_trait::async_trait;
use log::info;
use serde_json::Value;
use sqlx::Postgres;
use sqlx::postgres::{PgPool, PgPoolOptions};

use crate::backend::SqlRow;
use crate::conf::PostgresConfig;
use crate::core::{BackendError, ReelError};

use super::{SqlParam, SqlQuery};

/// Runs parameterized SQL and returns rows as column-name maps.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn fetch(&self, query: &SqlQuery) -> Result<Vec<SqlRow>, BackendError>;
}

impl From<sqlx::Error> for BackendError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => BackendError::Connection(err.to_string()),
            _ => BackendError::Query(err.to_string()),
        }
    }
}

/// PostgreSQL executor over a lazily connected pool. Every call acquires a
/// connection and returns it to the pool on all exit paths, including when
/// the surrounding deadline drops the future.
#[derive(Clone)]
pub struct PgExecutor {
    pool: PgPool,
}

impl PgExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn connect_lazy(config: &PostgresConfig) -> Result<Self, ReelError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect_lazy(&config.url)
            .map_err(|e| ReelError::ConfigParsingError(format!("postgres url: {e}")))?;
        info!(
            "postgres pool configured with {} connections",
            config.max_connections
        );
        Ok(Self { pool })
    }
}

#[async_trait]
impl SqlExecutor for PgExecutor {
    async fn fetch(&self, query: &SqlQuery) -> Result<Vec<SqlRow>, BackendError> {
        // Rows come back as JSON objects so column types do not need to be
        // known up front.
        let wrapped = format!("SELECT to_jsonb(q) FROM ({}) q", query.text);
        let mut statement = sqlx::query_scalar::<Postgres, Value>(&wrapped);
        for param in &query.params {
            statement = match param {
                SqlParam::Int(v) => statement.bind(*v),
                SqlParam::Float(v) => statement.bind(*v),
                SqlParam::Text(v) => statement.bind(v.clone()),
            };
        }
        let values = statement.fetch_all(&self.pool).await?;

        values
            .into_iter()
            .map(|value| match value {
                Value::Object(row) => Ok(row),
                other => Err(BackendError::Query(format!(
                    "expected a JSON object per row, got {other}"
                ))),
            })
            .collect()
    }
}
