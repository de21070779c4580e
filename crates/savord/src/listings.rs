//! Listing service - normalized views over the directory client.
//!
//! Converts raw directory records into `Restaurant` values and fans out
//! batch lookups safely.

use std::sync::Arc;

use anyhow::{Context, Result};

use savor_common::{join_successes, Restaurant};

use crate::directory::Directory;

pub struct ListingService {
    directory: Arc<dyn Directory>,
}

impl ListingService {
    pub fn new(directory: Arc<dyn Directory>) -> Self {
        Self { directory }
    }

    /// Search the directory and normalize every hit. Any failure, upstream
    /// or malformed record, propagates to the caller.
    pub async fn search(
        &self,
        term: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<Restaurant>> {
        let records = self
            .directory
            .search(term, location, limit)
            .await
            .context("Directory search failed")?;

        records
            .iter()
            .map(|record| Restaurant::from_record(record).map_err(Into::into))
            .collect()
    }

    /// Resolve many ids concurrently, keeping only the ones that resolve
    /// and normalize cleanly. Input order is preserved.
    pub async fn lookup_many(&self, ids: &[String]) -> Vec<Restaurant> {
        let lookups: Vec<_> = ids.iter().map(|id| self.lookup_one(id)).collect();
        join_successes(lookups).await
    }

    async fn lookup_one(&self, id: &str) -> Result<Restaurant> {
        let record = self.directory.get_record(id).await?;
        Ok(Restaurant::from_record(&record)?)
    }
}
