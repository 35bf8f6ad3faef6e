//! Local filesystem storage implementation.
//!
//! Writes go to a temporary file first and are renamed into place, so a run
//! killed mid-write can never leave a partial file visible to readers.

use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::{Listing, StorageConfig};
use crate::storage::{ListingStore, Meta, SaveOutcome};

/// Local filesystem storage backend.
#[derive(Clone)]
pub struct LocalStore {
    data_dir: PathBuf,
    listings_file: String,
    meta_file: String,
    stamp_on_no_change: bool,
}

impl LocalStore {
    /// Create a store from persistence settings.
    pub fn new(config: &StorageConfig) -> Self {
        Self {
            data_dir: config.data_dir.clone(),
            listings_file: config.listings_file.clone(),
            meta_file: config.meta_file.clone(),
            stamp_on_no_change: config.stamp_on_no_change,
        }
    }

    fn path(&self, file: &str) -> PathBuf {
        self.data_dir.join(file)
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, file: &str, bytes: &[u8]) -> Result<()> {
        let path = self.path(file);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = path.with_extension("tmp");
        let mut handle = tokio::fs::File::create(&tmp).await?;
        handle.write_all(bytes).await?;
        handle.flush().await?;
        drop(handle);

        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    /// Read bytes, returning None if the file doesn't exist.
    async fn read_bytes(&self, file: &str) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(self.path(file)).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    async fn write_meta(&self, generated_at: DateTime<Utc>) -> Result<()> {
        let meta = Meta { generated_at };
        let mut bytes = serde_json::to_vec_pretty(&meta)?;
        bytes.push(b'\n');
        self.write_bytes(&self.meta_file, &bytes).await
    }
}

#[async_trait]
impl ListingStore for LocalStore {
    async fn load(&self) -> Result<Vec<Listing>> {
        match self.read_bytes(&self.listings_file).await? {
            Some(bytes) => Ok(serde_json::from_slice(&bytes)?),
            None => {
                log::info!("No {} found; starting from empty state", self.listings_file);
                Ok(Vec::new())
            }
        }
    }

    async fn save(
        &self,
        listings: &[Listing],
        generated_at: DateTime<Utc>,
    ) -> Result<SaveOutcome> {
        let mut bytes = serde_json::to_vec_pretty(listings)?;
        bytes.push(b'\n');

        let existing = self.read_bytes(&self.listings_file).await?;
        if existing.as_deref() == Some(bytes.as_slice()) {
            log::info!(
                "State unchanged ({} listings); skipping write",
                listings.len()
            );
            if self.stamp_on_no_change {
                self.write_meta(generated_at).await?;
            }
            return Ok(SaveOutcome::Unchanged {
                count: listings.len(),
            });
        }

        self.write_bytes(&self.listings_file, &bytes).await?;
        self.write_meta(generated_at).await?;
        log::info!("Wrote {} listings to {}", listings.len(), self.listings_file);

        Ok(SaveOutcome::Written {
            count: listings.len(),
        })
    }

    async fn load_meta(&self) -> Result<Option<Meta>> {
        match self.read_bytes(&self.meta_file).await? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Candidate, ListingStatus};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn store(tmp: &TempDir, stamp_on_no_change: bool) -> LocalStore {
        LocalStore::new(&StorageConfig {
            data_dir: tmp.path().to_path_buf(),
            listings_file: "listings.json".to_string(),
            meta_file: "_meta.json".to_string(),
            stamp_on_no_change,
        })
    }

    fn sample_listings() -> Vec<Listing> {
        let candidate = Candidate {
            address: Some("12 Larapinta Drive".to_string()),
            beds: Some(3),
            price: Some("$650 pw".to_string()),
            link: "https://example.com/property-1".to_string(),
        };
        let today = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        vec![Listing::first_observed(&candidate, today)]
    }

    #[tokio::test]
    async fn test_first_run_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, false);

        assert!(store.load().await.unwrap().is_empty());
        assert!(store.load_meta().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, false);
        let listings = sample_listings();

        let outcome = store.save(&listings, Utc::now()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Written { count: 1 });

        let loaded = store.load().await.unwrap();
        assert_eq!(loaded, listings);
        assert_eq!(loaded[0].status, ListingStatus::Available);
        assert!(store.load_meta().await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_identical_state_skips_write() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, false);
        let listings = sample_listings();

        store.save(&listings, Utc::now()).await.unwrap();
        let meta_before = tokio::fs::read(tmp.path().join("_meta.json")).await.unwrap();

        let outcome = store.save(&listings, Utc::now()).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Unchanged { count: 1 });

        let meta_after = tokio::fs::read(tmp.path().join("_meta.json")).await.unwrap();
        assert_eq!(meta_before, meta_after);
    }

    #[tokio::test]
    async fn test_stamp_on_no_change_refreshes_meta() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, true);
        let listings = sample_listings();

        let t1 = "2024-01-10T00:00:00Z".parse().unwrap();
        let t2 = "2024-01-11T00:00:00Z".parse().unwrap();

        store.save(&listings, t1).await.unwrap();
        let outcome = store.save(&listings, t2).await.unwrap();
        assert_eq!(outcome, SaveOutcome::Unchanged { count: 1 });

        let meta = store.load_meta().await.unwrap().unwrap();
        assert_eq!(meta.generated_at, t2);
    }

    #[tokio::test]
    async fn test_no_temp_files_left_behind() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, false);

        store.save(&sample_listings(), Utc::now()).await.unwrap();

        let mut entries = tokio::fs::read_dir(tmp.path()).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            let name = entry.file_name();
            assert!(!name.to_string_lossy().ends_with(".tmp"), "stray {name:?}");
        }
    }

    #[tokio::test]
    async fn test_serialized_field_names_are_stable() {
        let tmp = TempDir::new().unwrap();
        let store = store(&tmp, false);

        store.save(&sample_listings(), Utc::now()).await.unwrap();

        let raw = tokio::fs::read_to_string(tmp.path().join("listings.json"))
            .await
            .unwrap();
        for field in [
            "\"address\"",
            "\"beds\"",
            "\"price\"",
            "\"link\"",
            "\"status\"",
            "\"firstSeen\"",
            "\"lastSeen\"",
            "\"lastSeenAvailable\"",
            "\"daysAvailable\"",
            "\"daysToLease\"",
        ] {
            assert!(raw.contains(field), "missing {field} in {raw}");
        }
    }
}
