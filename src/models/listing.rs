//! Listing lifecycle data structures.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::utils::date::days_between;

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ListingStatus {
    /// Currently observed on the source page
    Available,
    /// No longer observed on the source page
    Leased,
}

/// A normalized listing observation produced by extraction.
///
/// Not persisted; only its effect on [`Listing`] records survives a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub address: Option<String>,
    pub beds: Option<u32>,
    pub price: Option<String>,
    /// Canonical absolute URL to the listing
    pub link: String,
}

impl Candidate {
    /// A candidate with neither address nor price carries no usable data
    /// and is dropped before reconciliation.
    pub fn is_empty(&self) -> bool {
        self.address.is_none() && self.price.is_none()
    }

    /// Stable identity key, shared with [`Listing::dedup_key`].
    pub fn dedup_key(&self) -> String {
        compose_key(
            &self.link,
            self.address.as_deref(),
            self.beds,
            self.price.as_deref(),
        )
    }
}

/// A persisted listing record with its lifecycle fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub address: Option<String>,
    pub beds: Option<u32>,
    pub price: Option<String>,
    pub link: String,
    pub status: ListingStatus,

    /// Date of first observation; immutable once set
    pub first_seen: NaiveDate,
    /// Date of the most recent run that touched this record
    pub last_seen: NaiveDate,
    /// Date of the most recent run that observed this record in the snapshot
    pub last_seen_available: NaiveDate,

    /// Inclusive day count from `first_seen` to `last_seen_available`
    pub days_available: i64,
    /// Set once at the transition to `Leased` and frozen thereafter
    pub days_to_lease: Option<i64>,
}

impl Listing {
    /// Create a record for a listing observed for the first time.
    pub fn first_observed(candidate: &Candidate, today: NaiveDate) -> Self {
        Self {
            address: candidate.address.clone(),
            beds: candidate.beds,
            price: candidate.price.clone(),
            link: candidate.link.clone(),
            status: ListingStatus::Available,
            first_seen: today,
            last_seen: today,
            last_seen_available: today,
            days_available: 1,
            days_to_lease: None,
        }
    }

    /// Fold a fresh observation into this record.
    ///
    /// Descriptive fields take the candidate's value when present, else keep
    /// the prior value. A `Leased` record that reappears reverts to
    /// `Available`; its `days_to_lease` is cleared so the status invariant
    /// holds.
    pub fn observe(&mut self, candidate: &Candidate, today: NaiveDate) {
        if candidate.address.is_some() {
            self.address = candidate.address.clone();
        }
        if candidate.beds.is_some() {
            self.beds = candidate.beds;
        }
        if candidate.price.is_some() {
            self.price = candidate.price.clone();
        }
        if !candidate.link.is_empty() {
            self.link = candidate.link.clone();
        }
        self.status = ListingStatus::Available;
        self.last_seen = today;
        self.last_seen_available = today;
        self.days_available = days_between(self.first_seen, today);
        self.days_to_lease = None;
    }

    /// Transition an unobserved record to `Leased`.
    ///
    /// `days_to_lease` is computed once from the last date the listing was
    /// seen available and never recomputed on later runs.
    pub fn mark_leased(&mut self, today: NaiveDate) {
        self.status = ListingStatus::Leased;
        if self.days_to_lease.is_none() {
            self.days_to_lease = Some(days_between(self.first_seen, self.last_seen_available));
        }
        self.last_seen = today;
    }

    /// Stable identity key, shared with [`Candidate::dedup_key`].
    pub fn dedup_key(&self) -> String {
        compose_key(
            &self.link,
            self.address.as_deref(),
            self.beds,
            self.price.as_deref(),
        )
    }

    /// Day counter relevant to the current status.
    pub fn active_days(&self) -> i64 {
        match self.status {
            ListingStatus::Available => self.days_available,
            ListingStatus::Leased => self.days_to_lease.unwrap_or(-1),
        }
    }
}

/// Derive the dedup key for a record or candidate.
///
/// The canonical link is authoritative. The `address|beds|price` composite is
/// a fallback for rows where link extraction failed; it is never preferred
/// over a present link, since prices change between runs and would
/// double-count the listing.
fn compose_key(link: &str, address: Option<&str>, beds: Option<u32>, price: Option<&str>) -> String {
    if !link.trim().is_empty() {
        return link.to_string();
    }
    format!(
        "{}|{}|{}",
        address.unwrap_or(""),
        beds.map(|b| b.to_string()).unwrap_or_default(),
        price.unwrap_or("")
    )
}
