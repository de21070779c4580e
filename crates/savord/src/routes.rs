//! API routes for savord.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use savor_common::{Category, Location, Restaurant};

use crate::recommender::RecommendRequest;
use crate::server::AppState;
use crate::warmup::PARTNER_CACHE_KEY;

type AppStateArc = Arc<AppState>;

/// Header carrying a caller-supplied model-service credential.
pub const LLM_API_KEY_HEADER: &str = "x-llm-api-key";

/// How long direct search results stay cached.
const NEAR_YOU_TTL: Duration = Duration::from_secs(3600);

pub fn restaurant_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/restaurants/partner-approved", get(partner_approved))
        .route("/restaurants/near-you", get(near_you))
        .route("/restaurants/recommended", get(recommended))
}

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/health", get(health_check))
}

fn default_city() -> String {
    "San Francisco".to_string()
}

// ============================================================================
// Partner-approved
// ============================================================================

/// Always serve the pre-warmed list; never hit the directory at request
/// time. The placeholder list only shows up if the warmed entry vanished.
async fn partner_approved(State(state): State<AppStateArc>) -> Json<Vec<Restaurant>> {
    match state.cache.get(PARTNER_CACHE_KEY).await {
        Some(restaurants) => Json(restaurants),
        None => Json(placeholder_partners()),
    }
}

fn placeholder_partners() -> Vec<Restaurant> {
    vec![
        Restaurant {
            id: "mock-1".to_string(),
            name: "Mock Bistro".to_string(),
            url: "https://example.com/mock-bistro".to_string(),
            rating: 4.5,
            review_count: 120,
            price: Some("$$".to_string()),
            location: Location {
                address1: "123 Mockingbird Ln".to_string(),
                address2: None,
                address3: None,
                city: "San Francisco".to_string(),
                state: "CA".to_string(),
                zip_code: "94103".to_string(),
                country: "US".to_string(),
                display_address: vec![
                    "123 Mockingbird Ln".to_string(),
                    "San Francisco, CA 94103".to_string(),
                ],
            },
            phone: Some("415-555-1234".to_string()),
            categories: vec![Category {
                alias: "italian".to_string(),
                title: "Italian".to_string(),
            }],
            image_url: Some("https://example.com/photo1.jpg".to_string()),
            rationale: None,
        },
        Restaurant {
            id: "mock-2".to_string(),
            name: "Sample Sushi".to_string(),
            url: "https://example.com/sample-sushi".to_string(),
            rating: 4.0,
            review_count: 80,
            price: Some("$$$".to_string()),
            location: Location {
                address1: "456 Sample St".to_string(),
                address2: None,
                address3: None,
                city: "San Francisco".to_string(),
                state: "CA".to_string(),
                zip_code: "94104".to_string(),
                country: "US".to_string(),
                display_address: vec![
                    "456 Sample St".to_string(),
                    "San Francisco, CA 94104".to_string(),
                ],
            },
            phone: Some("415-555-9876".to_string()),
            categories: vec![Category {
                alias: "sushi".to_string(),
                title: "Sushi Bars".to_string(),
            }],
            image_url: Some("https://example.com/photo2.jpg".to_string()),
            rationale: None,
        },
    ]
}

// ============================================================================
// Near-you
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct NearYouParams {
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default = "default_term")]
    pub term: String,
    #[serde(default = "default_near_you_limit")]
    pub limit: usize,
}

fn default_term() -> String {
    "restaurants".to_string()
}

fn default_near_you_limit() -> usize {
    10
}

/// Top directory matches near the supplied city, cached for an hour.
async fn near_you(
    State(state): State<AppStateArc>,
    Query(params): Query<NearYouParams>,
) -> Result<Json<Vec<Restaurant>>, (StatusCode, String)> {
    // Lower-cased on purpose; the recommendation key is case-sensitive.
    let cache_key = format!(
        "near_you::{}::{}::{}",
        params.city.to_lowercase(),
        params.term.to_lowercase(),
        params.limit
    );

    if let Some(cached) = state.cache.get(&cache_key).await {
        return Ok(Json(cached));
    }

    let results = state
        .listings
        .search(&params.term, &params.city, params.limit)
        .await
        .map_err(|e| {
            error!("Directory search failed: {:#}", e);
            (
                StatusCode::BAD_GATEWAY,
                format!("Directory search failed: {:#}", e),
            )
        })?;

    state
        .cache
        .set(&cache_key, results.clone(), Some(NEAR_YOU_TTL))
        .await;

    Ok(Json(results))
}

// ============================================================================
// Recommended
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RecommendedParams {
    #[serde(default)]
    pub query: String,
    #[serde(default = "default_city")]
    pub city: String,
    #[serde(default)]
    pub cuisines: String,
    #[serde(default)]
    pub prices: String,
    #[serde(default = "default_recommended_limit")]
    pub limit: usize,
}

fn default_recommended_limit() -> usize {
    5
}

/// AI-assisted recommendations, using the caller's model-service key
/// when supplied.
async fn recommended(
    State(state): State<AppStateArc>,
    Query(params): Query<RecommendedParams>,
    headers: HeaderMap,
) -> Result<Json<Vec<Restaurant>>, (StatusCode, String)> {
    info!("Recommendation request: city={} query={}", params.city, params.query);

    let api_key = headers
        .get(LLM_API_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_string());

    let request = RecommendRequest {
        city: params.city,
        query: params.query,
        cuisines: split_filters(&params.cuisines),
        prices: split_filters(&params.prices),
        limit: params.limit,
        api_key,
    };

    state
        .recommender
        .recommend(request)
        .await
        .map(Json)
        .map_err(|e| {
            error!("Recommendation failed: {:#}", e);
            (
                StatusCode::BAD_GATEWAY,
                format!("Recommendation failed: {:#}", e),
            )
        })
}

/// Comma-separated filter list; the empty string is an empty list.
fn split_filters(raw: &str) -> Vec<String> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(',').map(|part| part.to_string()).collect()
}

// ============================================================================
// Health
// ============================================================================

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}
