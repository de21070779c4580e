//! Directory client - talks to the business-directory API.
//!
//! One outbound HTTP call per operation with a bounded timeout and no
//! retries. Callers decide whether an unavailable directory is fatal.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use savor_common::{DirectoryConfig, DirectoryRecord};

/// Directory client errors; both variants mean the upstream is
/// unavailable for this call.
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("directory returned HTTP {0}")]
    Status(u16),

    #[error("directory request failed: {0}")]
    Transport(String),
}

/// Directory capability used by the listing service and the recommender.
///
/// Production code uses [`HttpDirectory`]; tests use [`FakeDirectory`]
/// with canned records.
#[async_trait]
pub trait Directory: Send + Sync {
    /// Search listings near a location.
    async fn search(
        &self,
        term: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError>;

    /// Fetch a single listing by its directory-assigned id.
    async fn get_record(&self, id: &str) -> Result<DirectoryRecord, DirectoryError>;
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    businesses: Vec<DirectoryRecord>,
}

/// Real client backed by reqwest.
pub struct HttpDirectory {
    base_url: String,
    api_key: Option<String>,
    http: reqwest::Client,
}

impl HttpDirectory {
    pub fn new(config: &DirectoryConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build directory HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            http,
        })
    }

    fn request(&self, url: String) -> reqwest::RequestBuilder {
        let mut request = self.http.get(url);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        request
    }
}

#[async_trait]
impl Directory for HttpDirectory {
    async fn search(
        &self,
        term: &str,
        location: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        debug!("Directory search: term={} location={}", term, location);

        let limit = limit.to_string();
        let response = self
            .request(format!("{}/search", self.base_url))
            .query(&[("term", term), ("location", location), ("limit", &limit)])
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status().as_u16()));
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        Ok(body.businesses)
    }

    async fn get_record(&self, id: &str) -> Result<DirectoryRecord, DirectoryError> {
        debug!("Directory lookup: {}", id);

        let response = self
            .request(format!("{}/{}", self.base_url, id))
            .send()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(DirectoryError::Status(response.status().as_u16()));
        }

        response
            .json()
            .await
            .map_err(|e| DirectoryError::Transport(e.to_string()))
    }
}

/// Fake directory for tests: canned records keyed by id, optional
/// blanket failure, and call counters.
pub struct FakeDirectory {
    records: HashMap<String, DirectoryRecord>,
    fail_all: bool,
    search_calls: Mutex<usize>,
    lookup_calls: Mutex<usize>,
}

impl FakeDirectory {
    /// Records are keyed by their id; records without one are dropped.
    pub fn with_records(records: Vec<DirectoryRecord>) -> Self {
        let records = records
            .into_iter()
            .filter_map(|record| record.id.clone().map(|id| (id, record)))
            .collect();

        Self {
            records,
            fail_all: false,
            search_calls: Mutex::new(0),
            lookup_calls: Mutex::new(0),
        }
    }

    /// A directory where every call fails with HTTP 503.
    pub fn failing() -> Self {
        Self {
            records: HashMap::new(),
            fail_all: true,
            search_calls: Mutex::new(0),
            lookup_calls: Mutex::new(0),
        }
    }

    pub fn search_count(&self) -> usize {
        *self.search_calls.lock().unwrap()
    }

    pub fn lookup_count(&self) -> usize {
        *self.lookup_calls.lock().unwrap()
    }
}

#[async_trait]
impl Directory for FakeDirectory {
    async fn search(
        &self,
        _term: &str,
        _location: &str,
        limit: usize,
    ) -> Result<Vec<DirectoryRecord>, DirectoryError> {
        *self.search_calls.lock().unwrap() += 1;

        if self.fail_all {
            return Err(DirectoryError::Status(503));
        }

        let mut records: Vec<DirectoryRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| a.id.cmp(&b.id));
        records.truncate(limit);
        Ok(records)
    }

    async fn get_record(&self, id: &str) -> Result<DirectoryRecord, DirectoryError> {
        *self.lookup_calls.lock().unwrap() += 1;

        if self.fail_all {
            return Err(DirectoryError::Status(503));
        }

        self.records
            .get(id)
            .cloned()
            .ok_or(DirectoryError::Status(404))
    }
}
