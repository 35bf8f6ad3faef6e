//! Snapshot reconciliation engine.
//!
//! Merges one day's candidate snapshot into the persisted lifecycle state.
//! Pure in-memory merge, no I/O: callers decide whether a snapshot is
//! trustworthy enough to reconcile at all (see the empty-extraction abort in
//! the refresh pipeline).

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::models::{Candidate, Listing, ListingStatus};

/// Reconcile today's snapshot against the prior persisted state.
///
/// Candidates matching a prior record by dedup key update it in place,
/// including reviving `Leased` records the site lists again. Prior records
/// absent from the snapshot transition to `Leased` with a frozen
/// `days_to_lease`; records already `Leased` are carried forward untouched.
///
/// Running twice with the same snapshot and the same `today` yields identical
/// output, so a rerun of a scheduled job never double-counts days.
pub fn reconcile(candidates: &[Candidate], prior: &[Listing], today: NaiveDate) -> Vec<Listing> {
    let prior_by_key: HashMap<String, &Listing> = prior
        .iter()
        .map(|listing| (listing.dedup_key(), listing))
        .collect();

    let mut seen_today: HashSet<String> = HashSet::new();
    let mut merged: Vec<Listing> = Vec::with_capacity(prior.len() + candidates.len());

    for candidate in candidates {
        if candidate.is_empty() {
            continue;
        }

        let key = candidate.dedup_key();
        if !seen_today.insert(key.clone()) {
            // Duplicate anchor for the same listing in one snapshot;
            // the first occurrence already produced the record.
            continue;
        }

        match prior_by_key.get(&key) {
            Some(existing) => {
                let mut updated = (*existing).clone();
                updated.observe(candidate, today);
                merged.push(updated);
            }
            None => merged.push(Listing::first_observed(candidate, today)),
        }
    }

    for listing in prior {
        let key = listing.dedup_key();
        if seen_today.contains(&key) {
            continue;
        }
        // Defensive: duplicate keys cannot arise from a well-formed prior
        // state, but the merge must not emit them if they do.
        if !seen_today.insert(key) {
            continue;
        }

        let mut carried = listing.clone();
        if carried.status != ListingStatus::Leased {
            carried.mark_leased(today);
        }
        merged.push(carried);
    }

    sort_listings(&mut merged);
    merged
}

/// Deterministic persisted ordering: available listings first, longest
/// standing first within each status, beds then key as tiebreaks.
fn sort_listings(listings: &mut [Listing]) {
    listings.sort_by(|a, b| {
        let status = status_rank(a.status).cmp(&status_rank(b.status));
        status
            .then_with(|| b.active_days().cmp(&a.active_days()))
            .then_with(|| bed_rank(b).cmp(&bed_rank(a)))
            .then_with(|| a.dedup_key().cmp(&b.dedup_key()))
    });
}

fn status_rank(status: ListingStatus) -> u8 {
    match status {
        ListingStatus::Available => 0,
        ListingStatus::Leased => 1,
    }
}

fn bed_rank(listing: &Listing) -> i64 {
    listing.beds.map(i64::from).unwrap_or(-1)
}
