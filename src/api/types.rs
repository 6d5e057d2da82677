use serde::{Deserialize, Serialize};

use crate::query::{QueryKind, QueryParams};

/// Body of `POST /api/compare/benchmark`.
#[derive(Debug, Deserialize)]
pub struct BenchmarkRequest {
    pub query_type: String,
    #[serde(default)]
    pub iterations: Option<i64>,
    #[serde(default)]
    pub params: QueryParams,
}

/// Query string of `GET /api/{backend}/movies`. Fields are spelled out
/// rather than flattened so numeric values parse from the query string.
#[derive(Debug, Deserialize)]
pub struct MoviesQuery {
    #[serde(default = "MoviesQuery::default_kind")]
    pub kind: String,
    pub limit: Option<i64>,
    pub days: Option<i64>,
    #[serde(alias = "title")]
    pub q: Option<String>,
    pub genre: Option<String>,
    pub year_from: Option<i32>,
    pub year_to: Option<i32>,
}

impl MoviesQuery {
    fn default_kind() -> String {
        QueryKind::TopRatedMovies.as_str().to_string()
    }

    pub fn into_params(self) -> (String, QueryParams) {
        let params = QueryParams {
            limit: self.limit,
            days: self.days,
            q: self.q,
            genre: self.genre,
            year_from: self.year_from,
            year_to: self.year_to,
        };
        (self.kind, params)
    }
}

/// Error response format.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}
