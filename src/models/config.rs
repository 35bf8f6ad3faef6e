//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Source page settings
    #[serde(default)]
    pub source: SourceConfig,

    /// HTTP fetch and retry behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Candidate extraction selectors
    #[serde(default)]
    pub extract: ExtractConfig,

    /// Persistence settings
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.source.url.trim().is_empty() {
            return Err(AppError::validation("source.url is empty"));
        }
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::validation("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::validation("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.max_attempts == 0 {
            return Err(AppError::validation("fetcher.max_attempts must be > 0"));
        }
        if self.extract.anchor_selector.trim().is_empty() {
            return Err(AppError::validation("extract.anchor_selector is empty"));
        }
        if self.storage.listings_file.trim().is_empty() {
            return Err(AppError::validation("storage.listings_file is empty"));
        }
        if self.storage.meta_file.trim().is_empty() {
            return Err(AppError::validation("storage.meta_file is empty"));
        }
        Ok(())
    }
}

/// Source page settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the rental listings page
    #[serde(default = "defaults::source_url")]
    pub url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: defaults::source_url(),
        }
    }
}

/// HTTP client and retry/backoff behavior.
///
/// All retry state is carried here rather than in module-level globals so a
/// fetcher's policy is visible at its construction site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum fetch attempts before giving up
    #[serde(default = "defaults::max_attempts")]
    pub max_attempts: u32,

    /// Fixed delay between retries for ordinary failures, in seconds
    #[serde(default = "defaults::retry_delay")]
    pub retry_delay_secs: u64,

    /// Backoff before the first retry after a 429/503, in seconds
    #[serde(default = "defaults::rate_limit_backoff")]
    pub rate_limit_backoff_secs: u64,

    /// Backoff before subsequent retries after a 429/503, in seconds
    #[serde(default = "defaults::rate_limit_backoff_max")]
    pub rate_limit_backoff_max_secs: u64,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_attempts: defaults::max_attempts(),
            retry_delay_secs: defaults::retry_delay(),
            rate_limit_backoff_secs: defaults::rate_limit_backoff(),
            rate_limit_backoff_max_secs: defaults::rate_limit_backoff_max(),
        }
    }
}

/// CSS selectors used by the candidate extractor.
///
/// The source site's markup shifts over time; keeping the selectors in config
/// lets a deployment adjust without a rebuild.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Selector for listing anchors
    #[serde(default = "defaults::anchor_selector")]
    pub anchor_selector: String,

    /// Card ancestor element names, nearest wins
    #[serde(default = "defaults::card_ancestors")]
    pub card_ancestors: Vec<String>,

    /// Selector for the address node within a card
    #[serde(default = "defaults::address_selector")]
    pub address_selector: String,

    /// Selector for the price node within a card
    #[serde(default = "defaults::price_selector")]
    pub price_selector: String,

    /// Selector for bed-count nodes within a card
    #[serde(default = "defaults::beds_selector")]
    pub beds_selector: String,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            anchor_selector: defaults::anchor_selector(),
            card_ancestors: defaults::card_ancestors(),
            address_selector: defaults::address_selector(),
            price_selector: defaults::price_selector(),
            beds_selector: defaults::beds_selector(),
        }
    }
}

/// Persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the persisted state files
    #[serde(default = "defaults::data_dir")]
    pub data_dir: PathBuf,

    /// Listings file name within `data_dir`
    #[serde(default = "defaults::listings_file")]
    pub listings_file: String,

    /// Metadata file name within `data_dir`
    #[serde(default = "defaults::meta_file")]
    pub meta_file: String,

    /// Refresh `generatedAt` even when the listings are unchanged
    #[serde(default)]
    pub stamp_on_no_change: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: defaults::data_dir(),
            listings_file: defaults::listings_file(),
            meta_file: defaults::meta_file(),
            stamp_on_no_change: false,
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Source defaults
    pub fn source_url() -> String {
        "https://www.realestate.com.au/rent/in-alice+springs+-+greater+region,+nt/list-1?source=refinement".into()
    }

    // Fetcher defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; rentwatch/1.0; +https://github.com/)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_attempts() -> u32 {
        3
    }
    pub fn retry_delay() -> u64 {
        7
    }
    pub fn rate_limit_backoff() -> u64 {
        10
    }
    pub fn rate_limit_backoff_max() -> u64 {
        30
    }

    // Extractor defaults
    pub fn anchor_selector() -> String {
        r#"a[href*="/property-"]"#.into()
    }
    pub fn card_ancestors() -> Vec<String> {
        vec!["article".into(), "li".into(), "div".into()]
    }
    pub fn address_selector() -> String {
        r#"[data-testid*="address"], h2, h3"#.into()
    }
    pub fn price_selector() -> String {
        r#"[data-testid*="price"], .property-price"#.into()
    }
    pub fn beds_selector() -> String {
        r#"[aria-label*="bed"], [data-testid*="bed"]"#.into()
    }

    // Storage defaults
    pub fn data_dir() -> PathBuf {
        PathBuf::from("data")
    }
    pub fn listings_file() -> String {
        "listings.json".into()
    }
    pub fn meta_file() -> String {
        "_meta.json".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_default_config_ok() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn validate_rejects_empty_user_agent() {
        let mut config = Config::default();
        config.fetcher.user_agent = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_attempts() {
        let mut config = Config::default();
        config.fetcher.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn parse_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [fetcher]
            max_attempts = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.fetcher.max_attempts, 5);
        assert_eq!(config.fetcher.rate_limit_backoff_secs, 10);
        assert_eq!(config.storage.listings_file, "listings.json");
    }
}
