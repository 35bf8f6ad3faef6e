//! Storage abstractions for listing persistence.
//!
//! ## File Layout
//!
//! ```text
//! {data_dir}/
//! ├── listings.json         # Full persisted state, one JSON array
//! └── _meta.json            # { "generatedAt": <ISO 8601 timestamp> }
//! ```
//!
//! A save is skipped when the serialized state is byte-identical to what is
//! already on disk, so a no-change run never churns timestamps or writes.

pub mod local;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Listing;

// Re-export for convenience
pub use local::LocalStore;

/// Metadata record accompanying the listings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Meta {
    /// Timestamp of the last content change
    #[serde(rename = "generatedAt")]
    pub generated_at: DateTime<Utc>,
}

/// What a save actually did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// State changed and both files were written
    Written { count: usize },
    /// Serialized state was byte-identical to disk; write skipped
    Unchanged { count: usize },
}

/// Trait for listing storage backends.
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Load the persisted state. An absent file is a first run, not an error.
    async fn load(&self) -> Result<Vec<Listing>>;

    /// Persist the reconciled state, skipping the write when unchanged.
    async fn save(
        &self,
        listings: &[Listing],
        generated_at: DateTime<Utc>,
    ) -> Result<SaveOutcome>;

    /// Load the metadata record if one exists.
    async fn load_meta(&self) -> Result<Option<Meta>>;
}
