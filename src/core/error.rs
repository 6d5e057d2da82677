use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::BackendTag;

#[derive(Debug, Error, PartialEq)]
pub enum ReelError {
    #[error("Cannot parse config: {0}")]
    ConfigParsingError(String),
    #[error("IO error: {0}")]
    IoError(String),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Backend(#[from] BackendError),
    #[error(transparent)]
    Normalization(#[from] NormalizationError),
}

impl From<std::io::Error> for ReelError {
    fn from(err: std::io::Error) -> Self {
        ReelError::IoError(err.to_string())
    }
}

/// Caller-supplied parameters that cannot be dispatched. Raised before any
/// backend is contacted.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    #[error("limit must be between 1 and {max}, got {got}")]
    Limit { got: i64, max: u32 },
    #[error("time window must be between 0 and {max} days, got {got}")]
    WindowDays { got: i64, max: u32 },
    #[error("iterations must be between 1 and {max}, got {got}")]
    Iterations { got: i64, max: u32 },
    #[error("release year must be between {min} and {max}, got {got}")]
    Year { got: i32, min: i32, max: i32 },
    #[error("year range is inverted: {from} > {to}")]
    YearRange { from: i32, to: i32 },
    #[error("unknown query type '{0}', expected one of: top_movies, trending, search")]
    UnknownQueryType(String),
    #[error("unknown backend '{0}', expected sql or nosql")]
    UnknownBackend(String),
}

/// Failure of a single adapter call. These are recorded as failed timing
/// samples and never abort a batch.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum BackendError {
    #[error("connection error: {0}")]
    Connection(String),
    #[error("query error: {0}")]
    Query(String),
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Connection(_) => ErrorKind::Connection,
            BackendError::Query(_) => ErrorKind::Query,
            BackendError::Timeout(_) => ErrorKind::Timeout,
        }
    }
}

/// Serializable tag of a [`BackendError`], reported in place of latency or
/// row counts when a call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Connection,
    Query,
    Timeout,
}

/// Raw backend output no longer matches the field mapping. This means the two
/// backends are not measured comparably anymore, so it is never swallowed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NormalizationError {
    #[error("{backend} row {row}: missing required field '{field}'")]
    MissingField {
        backend: BackendTag,
        row: usize,
        field: &'static str,
    },
    #[error("{backend} row {row}: field '{field}' is not {expected}")]
    WrongType {
        backend: BackendTag,
        row: usize,
        field: &'static str,
        expected: &'static str,
    },
    #[error("{backend} result carries a {found} payload")]
    PayloadMismatch {
        backend: BackendTag,
        found: &'static str,
    },
}
