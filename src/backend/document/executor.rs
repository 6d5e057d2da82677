use async_trait::async_trait;
use log::info;
use mongodb::bson::Document;
use mongodb::error::ErrorKind as MongoErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Database};
use tokio_stream::StreamExt;

use crate::conf::MongoConfig;
use crate::core::{BackendError, ReelError};

use super::Pipeline;

/// Runs an aggregation pipeline and returns the resulting documents.
#[async_trait]
pub trait DocumentExecutor: Send + Sync {
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>, BackendError>;
}

impl From<mongodb::error::Error> for BackendError {
    fn from(err: mongodb::error::Error) -> Self {
        match err.kind.as_ref() {
            MongoErrorKind::Io(_)
            | MongoErrorKind::ServerSelection { .. }
            | MongoErrorKind::ConnectionPoolCleared { .. }
            | MongoErrorKind::DnsResolve { .. } => BackendError::Connection(err.to_string()),
            _ => BackendError::Query(err.to_string()),
        }
    }
}

/// MongoDB executor. The driver keeps its own connection pool and checks a
/// connection out per operation.
#[derive(Clone)]
pub struct MongoExecutor {
    db: Database,
}

impl MongoExecutor {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Parses the connection string and builds a client. No connection is
    /// made until the first call.
    pub async fn connect(config: &MongoConfig) -> Result<Self, ReelError> {
        let mut options = ClientOptions::parse(&config.url)
            .await
            .map_err(|e| ReelError::ConfigParsingError(format!("mongo url: {e}")))?;
        options.app_name = Some(String::from("reelbench"));
        options.server_selection_timeout = Some(config.server_selection_timeout);
        let client = Client::with_options(options)
            .map_err(|e| ReelError::ConfigParsingError(format!("mongo client: {e}")))?;
        info!("mongo client configured for database '{}'", config.database);
        Ok(Self {
            db: client.database(&config.database),
        })
    }
}

#[async_trait]
impl DocumentExecutor for MongoExecutor {
    async fn aggregate(&self, pipeline: &Pipeline) -> Result<Vec<Document>, BackendError> {
        let cursor = self
            .db
            .collection::<Document>(pipeline.collection)
            .aggregate(pipeline.stages.clone())
            .await?;
        let docs = cursor.collect::<Result<Vec<Document>, _>>().await?;
        Ok(docs)
    }
}
