//! Recommendation pipeline.
//!
//! Orchestrates agent query -> directory lookups -> cache merge -> dedupe
//! -> rank -> cache write. Agent failure aborts the whole request;
//! per-candidate directory failures are skipped.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use savor_common::{Cache, Restaurant};

use crate::agent::{Candidate, CandidateQuery, SearchAgent};
use crate::directory::Directory;

/// Upper bound passed to the agent regardless of the caller's limit; this
/// bounds cost, not output size.
const MAX_AGENT_SUGGESTIONS: usize = 15;

/// How long a computed recommendation list stays valid.
const RECOMMEND_TTL: Duration = Duration::from_secs(600);

/// One inbound recommendation request.
#[derive(Debug, Clone, Default)]
pub struct RecommendRequest {
    pub city: String,
    pub query: String,
    pub cuisines: Vec<String>,
    pub prices: Vec<String>,
    pub limit: usize,
    /// Caller-supplied model-service credential, if any.
    pub api_key: Option<String>,
}

pub struct RecommenderService {
    directory: Arc<dyn Directory>,
    agent: Arc<dyn SearchAgent>,
    cache: Arc<dyn Cache>,
}

impl RecommenderService {
    pub fn new(
        directory: Arc<dyn Directory>,
        agent: Arc<dyn SearchAgent>,
        cache: Arc<dyn Cache>,
    ) -> Self {
        Self {
            directory,
            agent,
            cache,
        }
    }

    /// Produce a ranked list of at most `limit` restaurants.
    pub async fn recommend(&self, request: RecommendRequest) -> Result<Vec<Restaurant>> {
        // Case-sensitive on purpose; the near-you key lower-cases instead.
        let cache_key = format!("{}:{}", request.city, request.query);
        let cached = self.cache.get(&cache_key).await.unwrap_or_default();

        // An unexpired list that already satisfies the requested size is
        // authoritative until it expires; the agent is not consulted.
        if !cached.is_empty() && cached.len() >= request.limit {
            let mut list = cached;
            list.truncate(request.limit);
            return Ok(list);
        }

        let candidates = self
            .agent
            .find_candidates(&CandidateQuery {
                city: request.city.clone(),
                query: request.query.clone(),
                cuisines: request.cuisines.clone(),
                prices: request.prices.clone(),
                max_suggestions: MAX_AGENT_SUGGESTIONS,
                api_key: request.api_key.clone(),
            })
            .await
            .context("Candidate search failed")?;

        let fresh = self.resolve_candidates(candidates).await;

        // Merge with the cached list; fresh entries win on id collision.
        let mut merged: HashMap<String, Restaurant> = cached
            .into_iter()
            .map(|restaurant| (restaurant.id.clone(), restaurant))
            .collect();
        merged.extend(
            fresh
                .into_iter()
                .map(|restaurant| (restaurant.id.clone(), restaurant)),
        );

        let mut ranked: Vec<Restaurant> = merged.into_values().collect();
        rank(&mut ranked);
        ranked.truncate(request.limit);

        self.cache
            .set(&cache_key, ranked.clone(), Some(RECOMMEND_TTL))
            .await;

        Ok(ranked)
    }

    /// Resolve candidates against the directory, skipping any that fail.
    /// Candidates sharing an extracted id collapse into one lookup.
    async fn resolve_candidates(&self, candidates: HashSet<Candidate>) -> Vec<Restaurant> {
        let mut seen: HashSet<String> = HashSet::new();
        let mut fresh = Vec::new();

        for candidate in candidates {
            let id = extract_listing_id(&candidate.reference_url).to_string();
            if id.is_empty() || !seen.insert(id.clone()) {
                continue;
            }

            match self.resolve_one(&id, &candidate).await {
                Ok(restaurant) => fresh.push(restaurant),
                Err(e) => debug!("Skipping candidate {}: {:#}", candidate.name, e),
            }
        }

        fresh
    }

    async fn resolve_one(&self, id: &str, candidate: &Candidate) -> Result<Restaurant> {
        let record = self.directory.get_record(id).await?;
        Ok(Restaurant::from_record(&record)?.with_rationale(candidate.rationale.clone()))
    }
}

/// The directory id is the trailing path segment of a candidate's
/// reference url.
pub fn extract_listing_id(url: &str) -> &str {
    url.trim_end_matches('/').rsplit('/').next().unwrap_or("")
}

/// Order by rating, then review count, both descending. Exact ties keep
/// their existing order.
pub fn rank(restaurants: &mut [Restaurant]) {
    restaurants.sort_by(|a, b| {
        b.rating
            .partial_cmp(&a.rating)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.review_count.cmp(&a.review_count))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use savor_common::{DirectoryRecord, Location};

    fn restaurant(id: &str, rating: f64, review_count: u32) -> Restaurant {
        let record = DirectoryRecord {
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
        };
        Restaurant::from_record(&record).unwrap()
    }

    #[test]
    fn test_extract_listing_id_trailing_slash() {
        assert_eq!(
            extract_listing_id("https://example.com/a/b/restaurant-id-123/"),
            "restaurant-id-123"
        );
    }

    #[test]
    fn test_extract_listing_id_no_trailing_slash() {
        assert_eq!(
            extract_listing_id("https://example.com/biz/tartine-bakery"),
            "tartine-bakery"
        );
    }

    #[test]
    fn test_extract_listing_id_bare_segment() {
        assert_eq!(extract_listing_id("tartine-bakery"), "tartine-bakery");
    }

    #[test]
    fn test_rank_by_rating_then_review_count() {
        let mut restaurants = vec![
            restaurant("b", 4.5, 50),
            restaurant("c", 4.0, 900),
            restaurant("a", 4.5, 100),
        ];
        rank(&mut restaurants);

        let ids: Vec<&str> = restaurants.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_rank_exact_ties_keep_order() {
        let mut restaurants = vec![
            restaurant("first", 4.0, 10),
            restaurant("second", 4.0, 10),
        ];
        rank(&mut restaurants);

        assert_eq!(restaurants[0].id, "first");
        assert_eq!(restaurants[1].id, "second");
    }
}
