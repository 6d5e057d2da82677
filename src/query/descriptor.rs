use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::ValidationError;

/// Upper bound on rows a single logical query may request.
pub const MAX_LIMIT: u32 = 100;

/// Longest accepted time window, one century.
pub const MAX_WINDOW_DAYS: u32 = 36_500;

/// Release years with a four-digit calendar representation. Both backends
/// agree on year bounds only inside this range.
pub const MIN_YEAR: i32 = 1;
pub const MAX_YEAR: i32 = 9999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    TopRatedMovies,
    SearchMovies,
    TrendingMovies,
}

impl QueryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryKind::TopRatedMovies => "top_rated_movies",
            QueryKind::SearchMovies => "search_movies",
            QueryKind::TrendingMovies => "trending_movies",
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "top_rated_movies" | "top_rated" | "top_movies" => Ok(QueryKind::TopRatedMovies),
            "search_movies" | "search" => Ok(QueryKind::SearchMovies),
            "trending_movies" | "trending" => Ok(QueryKind::TrendingMovies),
            _ => Err(ValidationError::UnknownQueryType(s.to_string())),
        }
    }
}

/// Optional criteria combined with AND. An absent field imposes no
/// constraint on either backend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Filters {
    /// Case-insensitive substring of the title.
    #[serde(default)]
    pub title_substring: Option<String>,
    /// Case-insensitive exact genre name.
    #[serde(default)]
    pub genre: Option<String>,
    /// Inclusive lower bound on release year.
    #[serde(default)]
    pub year_from: Option<i32>,
    /// Inclusive upper bound on release year.
    #[serde(default)]
    pub year_to: Option<i32>,
}

impl Filters {
    pub fn is_empty(&self) -> bool {
        self.title_substring.is_none()
            && self.genre.is_none()
            && self.year_from.is_none()
            && self.year_to.is_none()
    }

    fn validate(&self) -> Result<(), ValidationError> {
        for year in [self.year_from, self.year_to].into_iter().flatten() {
            if !(MIN_YEAR..=MAX_YEAR).contains(&year) {
                return Err(ValidationError::Year {
                    got: year,
                    min: MIN_YEAR,
                    max: MAX_YEAR,
                });
            }
        }
        if let (Some(from), Some(to)) = (self.year_from, self.year_to) {
            if from > to {
                return Err(ValidationError::YearRange { from, to });
            }
        }
        Ok(())
    }

    /// Blank strings are treated as absent, so `?q=` means "no title filter".
    fn trimmed(self) -> Self {
        fn non_blank(value: Option<String>) -> Option<String> {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        }
        Self {
            title_substring: non_blank(self.title_substring),
            genre: non_blank(self.genre),
            ..self
        }
    }
}

/// The single input both adapters accept. Only constructible through the
/// validating constructors, so a descriptor that reaches an adapter is
/// always dispatchable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryDescriptor {
    kind: QueryKind,
    limit: u32,
    time_window_days: Option<u32>,
    filters: Filters,
}

impl QueryDescriptor {
    pub fn new(kind: QueryKind, limit: i64) -> Result<Self, ValidationError> {
        if limit < 1 || limit > MAX_LIMIT as i64 {
            return Err(ValidationError::Limit {
                got: limit,
                max: MAX_LIMIT,
            });
        }
        Ok(Self {
            kind,
            limit: limit as u32,
            time_window_days: None,
            filters: Filters::default(),
        })
    }

    pub fn with_window_days(mut self, days: i64) -> Result<Self, ValidationError> {
        let days = u32::try_from(days)
            .ok()
            .filter(|d| *d <= MAX_WINDOW_DAYS)
            .ok_or(ValidationError::WindowDays {
                got: days,
                max: MAX_WINDOW_DAYS,
            })?;
        self.time_window_days = Some(days);
        Ok(self)
    }

    pub fn with_filters(mut self, filters: Filters) -> Result<Self, ValidationError> {
        filters.validate()?;
        self.filters = filters.trimmed();
        Ok(self)
    }

    pub fn kind(&self) -> QueryKind {
        self.kind
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn time_window_days(&self) -> Option<u32> {
        self.time_window_days
    }

    pub fn filters(&self) -> &Filters {
        &self.filters
    }
}
