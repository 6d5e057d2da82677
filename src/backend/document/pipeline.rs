use chrono::{DateTime, TimeDelta, Utc};
use mongodb::bson::{self, Bson, Document, doc};

use crate::conf::QueryConfig;
use crate::query::{Filters, QueryDescriptor, QueryKind};

const MS_PER_DAY: f64 = 86_400_000.0;

/// Interaction events that count towards trending, with their weights.
const EVENT_WEIGHTS: [(&str, f64); 4] = [
    ("page_view", 1.0),
    ("search", 0.5),
    ("add_to_cart", 3.0),
    ("purchase", 10.0),
];

/// An aggregation pipeline bound to the collection it runs against.
#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub collection: &'static str,
    pub stages: Vec<Document>,
}

impl Pipeline {
    /// Shell-style rendering used in comparison reports.
    pub fn to_shell(&self) -> String {
        let stages: Vec<Bson> = self.stages.iter().cloned().map(Bson::Document).collect();
        format!(
            "db.{}.aggregate({})",
            self.collection,
            Bson::Array(stages).into_relaxed_extjson()
        )
    }
}

/// Movie-level match on fields of the `movies` collection, optionally nested
/// under `prefix` after a `$lookup`.
fn movie_match(filters: &Filters, prefix: &str) -> Document {
    let field = |name: &str| format!("{prefix}{name}");
    let mut matcher = Document::new();
    if let Some(title) = &filters.title_substring {
        matcher.insert(
            field("title"),
            doc! { "$regex": regex::escape(title), "$options": "i" },
        );
    }
    if let Some(genre) = &filters.genre {
        let anchored = format!("^{}$", regex::escape(genre));
        matcher.insert(
            field("genres"),
            doc! { "$elemMatch": { "name": { "$regex": anchored, "$options": "i" } } },
        );
    }
    // release_date is a `YYYY-MM-DD` string and validated years have four
    // digits, so a lexicographic range selects whole years.
    let mut range = Document::new();
    if let Some(from) = filters.year_from {
        range.insert("$gte", format!("{from:04}-01-01"));
    }
    if let Some(to) = filters.year_to {
        range.insert("$lte", format!("{to:04}-12-31"));
    }
    if !range.is_empty() {
        matcher.insert(field("release_date"), range);
    }
    matcher
}

/// Start of the time window. Saturates at the earliest representable instant.
fn window_start(days: Option<u32>, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    days.map(|days| {
        now.checked_sub_signed(TimeDelta::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    })
}

fn bson_time(at: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(at.timestamp_millis())
}

/// Rating timestamps are stored either as BSON dates or as integer unix
/// seconds. Comparisons never cross BSON types, so each representation gets
/// its own bound.
fn rating_since_match(since: DateTime<Utc>) -> Document {
    doc! { "$or": [
        { "timestamp": { "$gte": bson_time(since) } },
        { "timestamp": { "$gte": since.timestamp() } },
    ] }
}

/// `$expr` form of [`rating_since_match`]. Inside `$expr` a date sorts above
/// every number, so the numeric branch is guarded by `$isNumber`.
fn rating_since_expr(since: DateTime<Utc>) -> Document {
    doc! { "$or": [
        { "$and": [
            { "$eq": [{ "$type": "$timestamp" }, "date"] },
            { "$gte": ["$timestamp", bson_time(since)] },
        ] },
        { "$and": [
            { "$isNumber": "$timestamp" },
            { "$gte": ["$timestamp", since.timestamp()] },
        ] },
    ] }
}

/// Joins the grouped `_id` (a movie id) to its movie document and applies the
/// movie filters.
fn join_movies(filters: &Filters) -> Vec<Document> {
    let mut stages = vec![
        doc! { "$lookup": {
            "from": "movies",
            "localField": "_id",
            "foreignField": "id",
            "as": "movie",
        } },
        doc! { "$unwind": "$movie" },
    ];
    let matcher = movie_match(filters, "movie.");
    if !matcher.is_empty() {
        stages.push(doc! { "$match": matcher });
    }
    stages
}

fn top_rated(descriptor: &QueryDescriptor, settings: &QueryConfig, now: DateTime<Utc>) -> Pipeline {
    let mut stages = Vec::new();
    if let Some(since) = window_start(descriptor.time_window_days(), now) {
        stages.push(doc! { "$match": rating_since_match(since) });
    }
    stages.push(doc! { "$group": {
        "_id": "$movieId",
        "avg_rating": { "$avg": "$rating" },
        "rating_count": { "$sum": 1 },
    } });
    stages.push(doc! { "$match": { "rating_count": { "$gte": i64::from(settings.min_support) } } });
    stages.extend(join_movies(descriptor.filters()));
    stages.push(doc! { "$sort": { "avg_rating": -1, "rating_count": -1, "_id": 1 } });
    stages.push(doc! { "$limit": i64::from(descriptor.limit()) });
    stages.push(doc! { "$project": {
        "_id": 0,
        "movie_id": "$_id",
        "title": "$movie.title",
        "avg_rating": 1,
        "rating_count": 1,
    } });
    Pipeline {
        collection: "ratings",
        stages,
    }
}

fn trending(descriptor: &QueryDescriptor, settings: &QueryConfig, now: DateTime<Utc>) -> Pipeline {
    let event_types: Vec<&str> = EVENT_WEIGHTS.iter().map(|(name, _)| *name).collect();
    let branches: Vec<Document> = EVENT_WEIGHTS
        .iter()
        .map(|(name, weight)| doc! { "case": { "$eq": ["$type", *name] }, "then": *weight })
        .collect();
    let now_ms = bson_time(now);
    let neg_decay = -settings.trending_decay;

    let mut events = doc! {
        "type": { "$in": event_types },
        "movie_id": { "$ne": Bson::Null },
    };
    if let Some(since) = window_start(descriptor.time_window_days(), now) {
        events.insert("timestamp", doc! { "$gte": bson_time(since) });
    }

    let mut stages = vec![
        doc! { "$match": events },
        doc! { "$addFields": { "weighted_score": { "$multiply": [
            { "$switch": { "branches": branches, "default": 0 } },
            { "$exp": { "$multiply": [
                neg_decay,
                { "$divide": [{ "$subtract": [now_ms, "$timestamp"] }, MS_PER_DAY] },
            ] } },
        ] } } },
        doc! { "$group": {
            "_id": "$movie_id",
            "trending_score": { "$sum": "$weighted_score" },
            "total_events": { "$sum": 1 },
        } },
    ];
    stages.extend(join_movies(descriptor.filters()));
    stages.push(doc! { "$sort": { "trending_score": -1, "_id": 1 } });
    stages.push(doc! { "$limit": i64::from(descriptor.limit()) });
    stages.push(doc! { "$project": {
        "_id": 0,
        "movie_id": "$_id",
        "title": "$movie.title",
        "trending_score": 1,
        "total_events": 1,
    } });
    Pipeline {
        collection: "events",
        stages,
    }
}

fn search(descriptor: &QueryDescriptor, now: DateTime<Utc>) -> Pipeline {
    let mut stages = Vec::new();
    let matcher = movie_match(descriptor.filters(), "");
    if !matcher.is_empty() {
        stages.push(doc! { "$match": matcher });
    }

    // The window only narrows which ratings are counted, not which movies match.
    let mut rating_conditions = vec![Bson::Document(doc! { "$eq": ["$movieId", "$$mid"] })];
    if let Some(since) = window_start(descriptor.time_window_days(), now) {
        rating_conditions.push(Bson::Document(rating_since_expr(since)));
    }
    stages.push(doc! { "$lookup": {
        "from": "ratings",
        "let": { "mid": "$id" },
        "pipeline": [
            { "$match": { "$expr": { "$and": rating_conditions } } },
            { "$count": "n" },
        ],
        "as": "rating_stats",
    } });
    stages.push(doc! { "$addFields": {
        "popularity": { "$ifNull": ["$popularity", 0.0] },
        "rating_count": { "$ifNull": [{ "$first": "$rating_stats.n" }, 0] },
    } });
    stages.push(doc! { "$sort": { "popularity": -1, "id": 1 } });
    stages.push(doc! { "$limit": i64::from(descriptor.limit()) });
    stages.push(doc! { "$project": {
        "_id": 0,
        "movie_id": "$id",
        "title": 1,
        "popularity": 1,
        "rating_count": 1,
    } });
    Pipeline {
        collection: "movies",
        stages,
    }
}

/// Translates a descriptor into an aggregation pipeline. `now` anchors the
/// time window and the trending decay.
pub fn build(descriptor: &QueryDescriptor, settings: &QueryConfig, now: DateTime<Utc>) -> Pipeline {
    match descriptor.kind() {
        QueryKind::TopRatedMovies => top_rated(descriptor, settings, now),
        QueryKind::TrendingMovies => trending(descriptor, settings, now),
        QueryKind::SearchMovies => search(descriptor, now),
    }
}
