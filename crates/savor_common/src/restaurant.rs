//! Canonical restaurant model and directory-record normalization.
//!
//! Directory payloads are decoded leniently (every field optional) so that
//! validation happens here, in one place, instead of inside the transport
//! layer. A `Restaurant` is never mutated after construction; attaching a
//! rationale builds a new value.

use serde::{Deserialize, Serialize};

/// Category tag on a listing: machine alias plus display title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub alias: String,
    pub title: String,
}

/// Street address block as the directory reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    #[serde(default)]
    pub address3: Option<String>,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub country: String,
    pub display_address: Vec<String>,
}

/// Raw business record from the directory service. Immutable once fetched;
/// required-field checks happen in [`Restaurant::from_record`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub review_count: Option<u32>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub location: Option<Location>,
    #[serde(default)]
    pub display_phone: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Normalization errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum RecordError {
    #[error("directory record missing required field: {0}")]
    MissingField(&'static str),
}

/// Canonical restaurant entity served by every endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: String,
    pub name: String,
    pub url: String,
    pub rating: f64,
    pub review_count: u32,
    pub price: Option<String>,
    pub location: Location,
    pub phone: Option<String>,
    pub categories: Vec<Category>,
    pub image_url: Option<String>,
    /// Present only when the entity came out of the recommendation
    /// pipeline; plain directory lookups leave it empty.
    pub rationale: Option<String>,
}

impl Restaurant {
    /// Normalize a raw directory record into the canonical shape.
    ///
    /// Fails if any required field is absent. Optional directory fields
    /// (price, phone, categories, image) pass through as-is.
    pub fn from_record(record: &DirectoryRecord) -> Result<Self, RecordError> {
        Ok(Self {
            id: record
                .id
                .clone()
                .ok_or(RecordError::MissingField("id"))?,
            name: record
                .name
                .clone()
                .ok_or(RecordError::MissingField("name"))?,
            url: record
                .url
                .clone()
                .ok_or(RecordError::MissingField("url"))?,
            rating: record.rating.ok_or(RecordError::MissingField("rating"))?,
            review_count: record
                .review_count
                .ok_or(RecordError::MissingField("review_count"))?,
            price: record.price.clone(),
            location: record
                .location
                .clone()
                .ok_or(RecordError::MissingField("location"))?,
            phone: record.display_phone.clone(),
            categories: record.categories.clone(),
            image_url: record.image_url.clone(),
            rationale: None,
        })
    }

    /// Build a rationale-bearing copy for the recommendation path.
    pub fn with_rationale(self, rationale: impl Into<String>) -> Self {
        Self {
            rationale: Some(rationale.into()),
            ..self
        }
    }
}
