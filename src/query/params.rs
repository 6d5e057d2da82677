use serde::{Deserialize, Serialize};

use crate::core::ValidationError;

use super::{Filters, QueryDescriptor, QueryKind};

/// Loosely typed request parameters as they arrive over HTTP or in a
/// benchmark body. Signed so negative values reach validation instead of
/// failing deserialization with an opaque message.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryParams {
    #[serde(default)]
    pub limit: Option<i64>,
    #[serde(default)]
    pub days: Option<i64>,
    #[serde(default, alias = "title")]
    pub q: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year_from: Option<i32>,
    #[serde(default)]
    pub year_to: Option<i32>,
}

impl QueryParams {
    pub fn default_limit(kind: QueryKind) -> i64 {
        match kind {
            QueryKind::SearchMovies => 20,
            QueryKind::TopRatedMovies | QueryKind::TrendingMovies => 10,
        }
    }

    pub fn default_window_days(kind: QueryKind) -> Option<i64> {
        match kind {
            QueryKind::TopRatedMovies => Some(30),
            QueryKind::TrendingMovies => Some(7),
            QueryKind::SearchMovies => None,
        }
    }

    pub fn into_descriptor(self, kind: QueryKind) -> Result<QueryDescriptor, ValidationError> {
        let limit = self.limit.unwrap_or_else(|| Self::default_limit(kind));
        let mut descriptor = QueryDescriptor::new(kind, limit)?;
        if let Some(days) = self.days.or_else(|| Self::default_window_days(kind)) {
            descriptor = descriptor.with_window_days(days)?;
        }
        descriptor.with_filters(Filters {
            title_substring: self.q,
            genre: self.genre,
            year_from: self.year_from,
            year_to: self.year_to,
        })
    }
}
