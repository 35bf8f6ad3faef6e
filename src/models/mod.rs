// src/models/mod.rs

//! Domain models for the rentwatch application.

mod config;
mod listing;

// Re-export all public types
pub use config::{Config, ExtractConfig, FetcherConfig, SourceConfig, StorageConfig};
pub use listing::{Candidate, Listing, ListingStatus};
