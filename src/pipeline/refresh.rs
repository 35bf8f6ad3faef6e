// src/pipeline/refresh.rs

//! The refresh pipeline: fetch → extract → reconcile → persist.
//!
//! One sequential run per invocation. Systemic failures (fetch exhaustion,
//! zero extracted candidates) abort before reconciliation so the prior state
//! is never corrupted; the scheduler sees a non-zero exit and the previous
//! "last refreshed" timestamp stays visible.

use chrono::{Local, NaiveDate, Utc};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Candidate, Config, Listing, ListingStatus};
use crate::pipeline::reconcile;
use crate::services::{PageFetcher, extract_candidates};
use crate::storage::{ListingStore, SaveOutcome};

/// Run one full refresh against the configured source page.
pub async fn run_refresh(config: &Config, store: &dyn ListingStore) -> Result<SaveOutcome> {
    let prior = store.load().await?;
    log::info!(
        "Starting refresh of {} ({} prior listings)",
        config.source.url,
        prior.len()
    );

    let fetcher = PageFetcher::new(&config.fetcher)?;
    let body = fetcher.fetch(&config.source.url).await?;

    let base_url = Url::parse(&config.source.url)?;
    let candidates = extract_candidates(&body, &base_url, &config.extract)?;

    let today = Local::now().date_naive();
    apply_snapshot(&candidates, &prior, store, &config.source.url, today).await
}

/// Reconcile an extracted snapshot into the store.
///
/// An empty snapshot aborts the run: zero candidates from a page that
/// previously listed rentals means the extractor broke, not that every
/// listing leased overnight.
pub async fn apply_snapshot(
    candidates: &[Candidate],
    prior: &[Listing],
    store: &dyn ListingStore,
    source_url: &str,
    today: NaiveDate,
) -> Result<SaveOutcome> {
    if candidates.is_empty() {
        return Err(AppError::EmptyExtraction {
            url: source_url.to_string(),
        });
    }

    let merged = reconcile(candidates, prior, today);

    let available = count_status(&merged, ListingStatus::Available);
    let leased = count_status(&merged, ListingStatus::Leased);
    log::info!(
        "Reconciled {} candidates into {} listings ({} available, {} leased)",
        candidates.len(),
        merged.len(),
        available,
        leased
    );

    store.save(&merged, Utc::now()).await
}

fn count_status(listings: &[Listing], status: ListingStatus) -> usize {
    listings.iter().filter(|l| l.status == status).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StorageConfig;
    use crate::storage::LocalStore;
    use tempfile::TempDir;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn store(tmp: &TempDir) -> LocalStore {
        LocalStore::new(&StorageConfig {
            data_dir: tmp.path().to_path_buf(),
            ..StorageConfig::default()
        })
    }

    fn candidate(link: &str) -> Candidate {
        Candidate {
            address: Some("7 Kurrajong Drive".to_string()),
            beds: Some(2),
            price: Some("$430 pw".to_string()),
            link: link.to_string(),
        }
    }

    #[tokio::test]
    async fn test_empty_snapshot_aborts_without_mass_leasing() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        // Seed a prior state with one available listing.
        let seeded = apply_snapshot(
            &[candidate("L1")],
            &[],
            &store,
            "https://example.com/rent",
            d("2024-01-01"),
        )
        .await
        .unwrap();
        assert_eq!(seeded, SaveOutcome::Written { count: 1 });

        let prior = store.load().await.unwrap();
        let result = apply_snapshot(&[], &prior, &store, "https://example.com/rent", d("2024-01-02")).await;
        assert!(matches!(result, Err(AppError::EmptyExtraction { .. })));

        // Prior state untouched: still available, nothing marked leased.
        let after = store.load().await.unwrap();
        assert_eq!(after, prior);
        assert_eq!(after[0].status, ListingStatus::Available);
    }

    #[tokio::test]
    async fn test_repeated_snapshot_skips_write() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);
        let snapshot = vec![candidate("L1"), candidate("L2")];

        let first = apply_snapshot(&snapshot, &[], &store, "u", d("2024-01-05"))
            .await
            .unwrap();
        assert_eq!(first, SaveOutcome::Written { count: 2 });

        let prior = store.load().await.unwrap();
        let second = apply_snapshot(&snapshot, &prior, &store, "u", d("2024-01-05"))
            .await
            .unwrap();
        assert_eq!(second, SaveOutcome::Unchanged { count: 2 });
    }

    #[tokio::test]
    async fn test_disappeared_listing_is_leased_and_persisted() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp);

        apply_snapshot(
            &[candidate("L1"), candidate("L2")],
            &[],
            &store,
            "u",
            d("2024-01-01"),
        )
        .await
        .unwrap();

        let prior = store.load().await.unwrap();
        apply_snapshot(&[candidate("L1")], &prior, &store, "u", d("2024-01-04"))
            .await
            .unwrap();

        let after = store.load().await.unwrap();
        let leased: Vec<_> = after
            .iter()
            .filter(|l| l.status == ListingStatus::Leased)
            .collect();
        assert_eq!(leased.len(), 1);
        assert_eq!(leased[0].link, "L2");
        assert_eq!(leased[0].days_to_lease, Some(1));
        assert_eq!(leased[0].last_seen, d("2024-01-04"));
    }
}
