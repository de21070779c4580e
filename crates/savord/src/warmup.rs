//! Startup warm-up for the partner-approved list.

use anyhow::Result;
use tracing::info;

use savor_common::Cache;

use crate::listings::ListingService;

/// Cache key the partner-approved route reads from.
pub const PARTNER_CACHE_KEY: &str = "partner_approved";

/// Directory ids for the partner restaurants, resolved once at startup.
const PARTNER_IDS: [&str; 3] = [
    "sotto-san-francisco",
    "che-fico-san-francisco",
    "tartine-bakery-san-francisco",
];

/// Resolve the partner list and cache it with no expiry. Zero resolved
/// partners is fatal: the service must not start without the list.
pub async fn warm_partner_list(cache: &dyn Cache, listings: &ListingService) -> Result<()> {
    let ids: Vec<String> = PARTNER_IDS.iter().map(|id| id.to_string()).collect();
    let restaurants = listings.lookup_many(&ids).await;

    if restaurants.is_empty() {
        anyhow::bail!("No valid partner restaurants resolved from the directory");
    }

    info!("Warmed partner list with {} restaurants", restaurants.len());
    cache.set(PARTNER_CACHE_KEY, restaurants, None).await;

    Ok(())
}
