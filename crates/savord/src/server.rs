//! HTTP server for savord.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;
use axum::http::HeaderValue;
use axum::Router;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use savor_common::Cache;

use crate::listings::ListingService;
use crate::recommender::RecommenderService;
use crate::routes;

/// Origins the development frontends call from.
const ALLOWED_ORIGINS: [&str; 3] = [
    "http://localhost:5173",
    "http://localhost:3000",
    "http://192.168.97.3:3000",
];

/// Application state shared across handlers
pub struct AppState {
    pub listings: Arc<ListingService>,
    pub recommender: Arc<RecommenderService>,
    pub cache: Arc<dyn Cache>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(
        listings: Arc<ListingService>,
        recommender: Arc<RecommenderService>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            listings,
            recommender,
            cache,
            start_time: Instant::now(),
        }
    }
}

/// Build the router; split out so tests can drive it in-process.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(ALLOWED_ORIGINS.map(HeaderValue::from_static)))
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::restaurant_routes())
        .merge(routes::health_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

/// Run the HTTP server
pub async fn run(state: AppState, addr: &str) -> Result<()> {
    let state = Arc::new(state);
    let app = app(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}
