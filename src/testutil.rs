//! Test and benchmark utilities.
//!
//! This module is only available when the `testutil` feature is enabled.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use mongodb::bson::{Document, doc};
use serde_json::json;

use crate::backend::{Backend, Backends, RawPayload, RawResult, SqlRow};
use crate::core::{BackendError, BackendTag};
use crate::query::{QueryDescriptor, QueryKind};
use crate::timing::Clock;

/// A clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }
}

/// What a [`MockBackend`] answers with.
#[derive(Debug, Clone)]
pub enum Response {
    /// Seeded fixture rows for the requested kind.
    Seeded,
    Payload(RawPayload),
    Fail(BackendError),
}

/// A scripted backend. Each call advances the shared [`ManualClock`] by the
/// next latency in `latencies` (cycled), records itself in the journal and
/// returns the configured response.
pub struct MockBackend {
    tag: BackendTag,
    response: Response,
    latencies: Vec<Duration>,
    clock: Arc<ManualClock>,
    calls: AtomicUsize,
    journal: Arc<Mutex<Vec<BackendTag>>>,
}

impl MockBackend {
    pub fn new(tag: BackendTag, clock: Arc<ManualClock>) -> Self {
        Self {
            tag,
            response: Response::Seeded,
            latencies: vec![Duration::from_millis(1)],
            clock,
            calls: AtomicUsize::new(0),
            journal: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn with_response(mut self, response: Response) -> Self {
        self.response = response;
        self
    }

    pub fn with_latencies(mut self, latencies: Vec<Duration>) -> Self {
        assert!(!latencies.is_empty());
        self.latencies = latencies;
        self
    }

    pub fn with_journal(mut self, journal: Arc<Mutex<Vec<BackendTag>>>) -> Self {
        self.journal = journal;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Backend for MockBackend {
    fn tag(&self) -> BackendTag {
        self.tag
    }

    fn describe(&self, descriptor: &QueryDescriptor) -> String {
        format!("mock {} {}", self.tag, descriptor.kind())
    }

    async fn execute(&self, descriptor: &QueryDescriptor) -> Result<RawResult, BackendError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        self.journal.lock().unwrap().push(self.tag);
        self.clock.advance(self.latencies[call % self.latencies.len()]);

        let payload = match &self.response {
            Response::Seeded => seeded_payload(self.tag, descriptor.kind()),
            Response::Payload(payload) => payload.clone(),
            Response::Fail(err) => return Err(err.clone()),
        };
        Ok(RawResult {
            kind: descriptor.kind(),
            payload,
        })
    }
}

/// Wraps two mocks into [`Backends`], keeping handles for call counts.
pub fn mock_backends(sql: Arc<MockBackend>, nosql: Arc<MockBackend>) -> Backends {
    Backends::new(sql, nosql)
}

/// `(movie_id, title, avg_rating, rating_count, popularity, trending_score, events)`
pub const SEEDED_MOVIES: [(i64, &str, f64, i64, f64, f64, i64); 3] = [
    (550, "Fight Club", 4.2, 1200, 61.4, 35.5, 2100),
    (680, "Pulp Fiction", 4.1, 950, 74.9, 28.0, 1700),
    (13, "Forrest Gump", 4.0, 800, 48.3, 12.25, 640),
];

/// Raw output both backends would return for the seeded dataset, using each
/// backend's own field names.
pub fn seeded_payload(tag: BackendTag, kind: QueryKind) -> RawPayload {
    match tag {
        BackendTag::Sql => RawPayload::Rows(seeded_sql_rows(kind)),
        BackendTag::Nosql => RawPayload::Documents(seeded_documents(kind)),
    }
}

fn ordered(kind: QueryKind) -> Vec<(i64, &'static str, f64, i64, f64, f64, i64)> {
    let mut movies = SEEDED_MOVIES.to_vec();
    match kind {
        QueryKind::TopRatedMovies => movies.sort_by(|a, b| b.2.total_cmp(&a.2)),
        QueryKind::SearchMovies => movies.sort_by(|a, b| b.4.total_cmp(&a.4)),
        QueryKind::TrendingMovies => movies.sort_by(|a, b| b.5.total_cmp(&a.5)),
    }
    movies
}

pub fn seeded_sql_rows(kind: QueryKind) -> Vec<SqlRow> {
    ordered(kind)
        .into_iter()
        .map(|(id, title, avg, ratings, popularity, trending, _)| {
            let row = match kind {
                QueryKind::TopRatedMovies => {
                    json!({
                        "movie_id": id,
                        "title": title,
                        "avg_rating": avg,
                        "rating_count": ratings,
                    })
                }
                QueryKind::SearchMovies => {
                    json!({
                        "movie_id": id,
                        "title": title,
                        "popularity": popularity,
                        "rating_count": ratings,
                    })
                }
                QueryKind::TrendingMovies => {
                    json!({
                        "movie_id": id,
                        "title": title,
                        "trending_score": trending,
                        "total_ratings": ratings,
                    })
                }
            };
            match row {
                serde_json::Value::Object(map) => map,
                _ => unreachable!(),
            }
        })
        .collect()
}

pub fn seeded_documents(kind: QueryKind) -> Vec<Document> {
    ordered(kind)
        .into_iter()
        .map(|(id, title, avg, ratings, popularity, trending, events)| match kind {
            QueryKind::TopRatedMovies => {
                doc! {
                    "movie_id": id as i32,
                    "title": title,
                    "avg_rating": avg,
                    "rating_count": ratings as i32,
                }
            }
            QueryKind::SearchMovies => {
                doc! {
                    "movie_id": id as i32,
                    "title": title,
                    "popularity": popularity,
                    "rating_count": ratings as i32,
                }
            }
            QueryKind::TrendingMovies => {
                doc! {
                    "movie_id": id as i32,
                    "title": title,
                    "trending_score": trending,
                    "total_events": events as i32,
                }
            }
        })
        .collect()
}
