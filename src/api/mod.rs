mod error;
mod handlers;
mod types;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use log::info;
use tower_http::trace::TraceLayer;

use crate::core::ReelError;
use crate::service::CompareService;

pub use error::ApiError;
pub use types::{BenchmarkRequest, ErrorResponse, MoviesQuery};

pub struct ReelApi {
    service: Arc<CompareService>,
}

impl ReelApi {
    pub fn new(service: CompareService) -> Self {
        Self {
            service: Arc::new(service),
        }
    }

    pub fn router(&self) -> Router {
        Router::new()
            .route("/health", get(handlers::health))
            .route("/api/compare/top-movies", get(handlers::compare_top_movies))
            .route("/api/compare/trending", get(handlers::compare_trending))
            .route("/api/compare/search", get(handlers::compare_search))
            .route("/api/compare/benchmark", post(handlers::benchmark))
            .route("/api/{backend}/movies", get(handlers::movies))
            .layer(TraceLayer::new_for_http())
            .with_state(self.service.clone())
    }

    pub async fn serve(self, addr: &str) -> Result<(), ReelError> {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| ReelError::IoError(format!("binding to {addr}: {e}")))?;
        info!("listening on {addr}");
        axum::serve(listener, self.router())
            .await
            .map_err(|e| ReelError::IoError(format!("serving: {e}")))?;
        Ok(())
    }
}
