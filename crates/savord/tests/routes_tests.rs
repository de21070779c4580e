//! Route behavior, driven in-process through the router.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use savor_common::{Cache, DirectoryRecord, Location, MemoryCache, Restaurant};
use savord::agent::{AgentError, FakeSearchAgent};
use savord::directory::FakeDirectory;
use savord::listings::ListingService;
use savord::recommender::RecommenderService;
use savord::server::{app, AppState};
use savord::warmup::PARTNER_CACHE_KEY;

fn record(id: &str, rating: f64, review_count: u32) -> DirectoryRecord {
    DirectoryRecord {
        id: Some(id.to_string()),
        name: Some(id.to_string()),
        url: Some(format!("https://directory.example/biz/{}", id)),
        rating: Some(rating),
        review_count: Some(review_count),
        location: Some(Location {
            address1: "1 Test St".to_string(),
            address2: None,
            address3: None,
            city: "San Francisco".to_string(),
            state: "CA".to_string(),
            zip_code: "94100".to_string(),
            country: "US".to_string(),
            display_address: vec!["1 Test St".to_string()],
        }),
        ..Default::default()
    }
}

fn test_app(
    directory: Arc<FakeDirectory>,
    agent: Arc<FakeSearchAgent>,
    cache: Arc<MemoryCache>,
) -> Router {
    let listings = Arc::new(ListingService::new(directory.clone()));
    let recommender = Arc::new(RecommenderService::new(directory, agent, cache.clone()));
    app(Arc::new(AppState::new(listings, recommender, cache)))
}

async fn get(router: Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

fn parse_restaurants(body: &[u8]) -> Vec<Restaurant> {
    serde_json::from_slice(body).unwrap()
}

#[tokio::test]
async fn test_partner_approved_serves_placeholder_without_warmed_entry() {
    let router = test_app(
        Arc::new(FakeDirectory::with_records(Vec::new())),
        Arc::new(FakeSearchAgent::always(Vec::new())),
        Arc::new(MemoryCache::new()),
    );

    let (status, body) = get(router, "/restaurants/partner-approved").await;

    assert_eq!(status, StatusCode::OK);
    let restaurants = parse_restaurants(&body);
    assert_eq!(restaurants.len(), 2);
    assert_eq!(restaurants[0].name, "Mock Bistro");
    assert_eq!(restaurants[1].name, "Sample Sushi");
}

#[tokio::test]
async fn test_partner_approved_serves_warmed_entry() {
    let cache = Arc::new(MemoryCache::new());
    let warmed = vec![Restaurant::from_record(&record("sotto-san-francisco", 4.5, 812)).unwrap()];
    cache.set(PARTNER_CACHE_KEY, warmed, None).await;

    let router = test_app(
        Arc::new(FakeDirectory::with_records(Vec::new())),
        Arc::new(FakeSearchAgent::always(Vec::new())),
        cache,
    );

    let (status, body) = get(router, "/restaurants/partner-approved").await;

    assert_eq!(status, StatusCode::OK);
    let restaurants = parse_restaurants(&body);
    assert_eq!(restaurants.len(), 1);
    assert_eq!(restaurants[0].id, "sotto-san-francisco");
}

#[tokio::test]
async fn test_near_you_searches_then_serves_from_cache() {
    let directory = Arc::new(FakeDirectory::with_records(vec![
        record("first", 4.0, 10),
        record("second", 4.5, 20),
    ]));
    let router = test_app(
        directory.clone(),
        Arc::new(FakeSearchAgent::always(Vec::new())),
        Arc::new(MemoryCache::new()),
    );

    let uri = "/restaurants/near-you?city=San%20Francisco&term=tacos&limit=10";
    let (status, body) = get(router.clone(), uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_restaurants(&body).len(), 2);
    assert_eq!(directory.search_count(), 1);

    // Second identical request is a cache hit.
    let (status, body) = get(router, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_restaurants(&body).len(), 2);
    assert_eq!(directory.search_count(), 1);
}

#[tokio::test]
async fn test_near_you_upstream_failure_is_bad_gateway() {
    let router = test_app(
        Arc::new(FakeDirectory::failing()),
        Arc::new(FakeSearchAgent::always(Vec::new())),
        Arc::new(MemoryCache::new()),
    );

    let (status, _body) = get(router, "/restaurants/near-you?city=Oakland").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_recommended_pipeline_failure_is_bad_gateway() {
    let router = test_app(
        Arc::new(FakeDirectory::with_records(Vec::new())),
        Arc::new(FakeSearchAgent::always_error(AgentError::EmptyResponse)),
        Arc::new(MemoryCache::new()),
    );

    let (status, _body) = get(router, "/restaurants/recommended?city=Oakland&query=brunch").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_recommended_happy_path() {
    let directory = Arc::new(FakeDirectory::with_records(vec![record("alpha", 4.8, 300)]));
    let agent = Arc::new(FakeSearchAgent::always(vec![savord::agent::Candidate {
        name: "alpha".to_string(),
        reference_url: "https://directory.example/biz/alpha/".to_string(),
        rationale: "A neighborhood favorite".to_string(),
    }]));
    let router = test_app(directory, agent, Arc::new(MemoryCache::new()));

    let (status, body) =
        get(router, "/restaurants/recommended?city=San%20Francisco&limit=2").await;

    assert_eq!(status, StatusCode::OK);
    let restaurants = parse_restaurants(&body);
    assert_eq!(restaurants.len(), 1);
    assert_eq!(restaurants[0].id, "alpha");
    assert_eq!(
        restaurants[0].rationale.as_deref(),
        Some("A neighborhood favorite")
    );
}

#[tokio::test]
async fn test_recommended_forwards_caller_credential() {
    let directory = Arc::new(FakeDirectory::with_records(vec![record("alpha", 4.8, 300)]));
    let agent = Arc::new(FakeSearchAgent::always(Vec::new()));
    let router = test_app(directory, agent.clone(), Arc::new(MemoryCache::new()));

    let response = router
        .oneshot(
            Request::builder()
                .uri("/restaurants/recommended?city=Oakland&cuisines=thai,italian")
                .header("x-llm-api-key", "caller-key")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let query = agent.last_query().unwrap();
    assert_eq!(query.api_key.as_deref(), Some("caller-key"));
    assert_eq!(query.city, "Oakland");
    assert_eq!(query.cuisines, vec!["thai".to_string(), "italian".to_string()]);
}

#[tokio::test]
async fn test_health_reports_healthy() {
    let router = test_app(
        Arc::new(FakeDirectory::with_records(Vec::new())),
        Arc::new(FakeSearchAgent::always(Vec::new())),
        Arc::new(MemoryCache::new()),
    );

    let (status, body) = get(router, "/health").await;

    assert_eq!(status, StatusCode::OK);
    let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["status"], "healthy");
}
