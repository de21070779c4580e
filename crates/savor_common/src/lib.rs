//! Savor Common - shared types for the Savor backend.
//!
//! Canonical restaurant model and normalization, the TTL result cache,
//! the fan-out-join-filter primitive, and service configuration.

pub mod cache;
pub mod config;
pub mod gather;
pub mod restaurant;

pub use cache::{Cache, MemoryCache};
pub use config::{AgentConfig, DirectoryConfig, ServiceConfig};
pub use gather::join_successes;
pub use restaurant::{Category, DirectoryRecord, Location, RecordError, Restaurant};
