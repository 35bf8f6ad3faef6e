// src/services/extract.rs

//! Candidate extraction from raw listing-page markup.
//!
//! Deliberately brittle, site-specific territory: selector chains with regex
//! fallbacks, tolerant of partially missing fields. Everything here produces
//! [`Candidate`] values only; lifecycle decisions belong to the
//! reconciliation engine.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Candidate, ExtractConfig};
use crate::utils::resolve_url;

/// Extract candidate records from a listing page.
///
/// Anchors matching the configured selector identify listings; each anchor's
/// nearest card ancestor is scanned for descriptive fields. Candidates with
/// neither address nor price are dropped.
pub fn extract_candidates(
    html: &str,
    base_url: &Url,
    config: &ExtractConfig,
) -> Result<Vec<Candidate>> {
    let document = Html::parse_document(html);

    let anchor_sel = parse_selector(&config.anchor_selector)?;
    let address_sel = parse_selector(&config.address_selector)?;
    let price_sel = parse_selector(&config.price_selector)?;
    let beds_sel = parse_selector(&config.beds_selector)?;

    let mut candidates = Vec::new();

    for anchor in document.select(&anchor_sel) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let link = resolve_url(base_url, href);

        let Some(card) = nearest_card(anchor, &config.card_ancestors) else {
            continue;
        };

        let candidate = Candidate {
            address: select_text(card, &address_sel),
            beds: extract_beds(card, &beds_sel),
            price: extract_price(card, &price_sel),
            link,
        };

        if candidate.is_empty() {
            log::debug!("Dropping candidate with no address or price: {}", candidate.link);
            continue;
        }
        candidates.push(candidate);
    }

    Ok(candidates)
}

/// Walk up from the anchor to the nearest configured card element.
fn nearest_card<'a>(anchor: ElementRef<'a>, ancestors: &[String]) -> Option<ElementRef<'a>> {
    anchor.ancestors().find_map(|node| {
        let element = ElementRef::wrap(node)?;
        let name = element.value().name();
        ancestors.iter().any(|a| a.as_str() == name).then_some(element)
    })
}

/// First non-empty text match for a selector within the card.
fn select_text(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    card.select(selector)
        .map(|el| normalize_whitespace(&el.text().collect::<String>()))
        .find(|text| !text.is_empty())
}

/// Price from the configured node, else a `$`-amount token in the card text.
fn extract_price(card: ElementRef<'_>, selector: &Selector) -> Option<String> {
    if let Some(text) = select_text(card, selector) {
        return Some(text);
    }

    let pattern =
        Regex::new(r"(?i)\$\s*[\d,]+(?:\.\d+)?(?:\s*(?:pw|p/w|per week|weekly))?").ok()?;
    let card_text = normalize_whitespace(&card.text().collect::<String>());
    pattern
        .find(&card_text)
        .map(|m| m.as_str().trim().to_string())
}

/// Bed count from marked nodes, else a "N bed" token in the card text.
fn extract_beds(card: ElementRef<'_>, selector: &Selector) -> Option<u32> {
    let pattern = Regex::new(r"(?i)(\d+)\s*(?:bed|beds|br|bedroom|bedrooms)").ok()?;

    for node in card.select(selector) {
        let label = node
            .value()
            .attr("aria-label")
            .map(str::to_string)
            .unwrap_or_else(|| node.text().collect::<String>());
        if let Some(beds) = first_capture_u32(&pattern, &label) {
            return Some(beds);
        }
    }

    let card_text = card.text().collect::<String>();
    first_capture_u32(&pattern, &card_text)
}

fn first_capture_u32(pattern: &Regex, text: &str) -> Option<u32> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
