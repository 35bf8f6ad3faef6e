//! Network and extraction services.

pub mod extract;
pub mod fetch;

pub use extract::extract_candidates;
pub use fetch::PageFetcher;
