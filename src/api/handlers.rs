use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::Deserialize;

use crate::bench::BenchmarkReport;
use crate::compare::ComparisonReport;
use crate::core::BackendTag;
use crate::query::{Filters, QueryKind, QueryParams, ResultRow};
use crate::service::CompareService;

use super::error::ApiError;
use super::types::{BenchmarkRequest, MoviesQuery};

pub async fn health() -> &'static str {
    "OK"
}

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub limit: Option<i64>,
    pub days: Option<i64>,
}

pub async fn compare_top_movies(
    State(service): State<Arc<CompareService>>,
    Query(q): Query<WindowQuery>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let kind = QueryKind::TopRatedMovies;
    let limit = q.limit.unwrap_or_else(|| QueryParams::default_limit(kind));
    let days = q.days.or_else(|| QueryParams::default_window_days(kind));
    Ok(Json(service.compare_top_movies(limit, days).await?))
}

pub async fn compare_trending(
    State(service): State<Arc<CompareService>>,
    Query(q): Query<WindowQuery>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let kind = QueryKind::TrendingMovies;
    let limit = q.limit.unwrap_or_else(|| QueryParams::default_limit(kind));
    let days = q.days.or_else(|| QueryParams::default_window_days(kind));
    Ok(Json(service.compare_trending(limit, days).await?))
}

pub async fn compare_search(
    State(service): State<Arc<CompareService>>,
    Query(params): Query<QueryParams>,
) -> Result<Json<ComparisonReport>, ApiError> {
    let limit = params
        .limit
        .unwrap_or_else(|| QueryParams::default_limit(QueryKind::SearchMovies));
    let filters = Filters {
        title_substring: params.q,
        genre: params.genre,
        year_from: params.year_from,
        year_to: params.year_to,
    };
    Ok(Json(service.compare_search(filters, limit, params.days).await?))
}

pub async fn benchmark(
    State(service): State<Arc<CompareService>>,
    Json(req): Json<BenchmarkRequest>,
) -> Result<Json<BenchmarkReport>, ApiError> {
    let report = service
        .run_benchmark(&req.query_type, req.iterations, req.params)
        .await?;
    Ok(Json(report))
}

pub async fn movies(
    State(service): State<Arc<CompareService>>,
    Path(backend): Path<String>,
    Query(q): Query<MoviesQuery>,
) -> Result<Json<Vec<ResultRow>>, ApiError> {
    let tag: BackendTag = backend.parse()?;
    let (kind, params) = q.into_params();
    let kind: QueryKind = kind.parse()?;
    let descriptor = params.into_descriptor(kind)?;
    Ok(Json(service.query(tag, &descriptor).await?))
}
