//! Savor daemon - restaurant recommendation backend.
//!
//! Aggregates a business directory and an LLM web-search agent, merges
//! and ranks results, and serves them over HTTP.

use std::sync::Arc;

use anyhow::Result;
use tracing::{info, Level};

use savor_common::{Cache, MemoryCache, ServiceConfig};
use savord::agent::{HttpSearchAgent, SearchAgent};
use savord::directory::{Directory, HttpDirectory};
use savord::listings::ListingService;
use savord::recommender::RecommenderService;
use savord::server::{run, AppState};
use savord::warmup::warm_partner_list;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .init();

    info!("Savor daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = ServiceConfig::from_env();

    let directory: Arc<dyn Directory> = Arc::new(HttpDirectory::new(&config.directory)?);
    let agent: Arc<dyn SearchAgent> = Arc::new(HttpSearchAgent::new(config.agent.clone())?);
    let cache: Arc<dyn Cache> = Arc::new(MemoryCache::new());

    let listings = Arc::new(ListingService::new(directory.clone()));
    let recommender = Arc::new(RecommenderService::new(
        directory,
        agent,
        cache.clone(),
    ));

    // The partner list must resolve before the server comes up.
    warm_partner_list(cache.as_ref(), &listings).await?;

    let state = AppState::new(listings, recommender, cache);
    run(state, &config.bind_addr).await
}
