// src/services/fetch.rs

//! Page fetcher with retry and backoff.
//!
//! The only component that touches the network. Exhausting the retry budget
//! yields [`AppError::Fetch`] and the caller must abort the run with prior
//! state untouched; a failed fetch is never "no listings exist".

use std::time::Duration;

use reqwest::{Client, StatusCode};

use crate::error::{AppError, Result};
use crate::models::FetcherConfig;

/// Why a fetch attempt failed, for backoff selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FailureKind {
    /// 429 or 503 from the source site
    RateLimited,
    /// Any other non-2xx status, transport error, or empty body
    Other,
}

/// HTTP page fetcher with an explicit retry policy.
pub struct PageFetcher {
    client: Client,
    config: FetcherConfig,
}

impl PageFetcher {
    /// Create a fetcher with the given policy.
    pub fn new(config: &FetcherConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Fetch the raw page body, retrying per the configured policy.
    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut last_failure = String::new();

        for attempt in 1..=self.config.max_attempts {
            let kind = match self.try_fetch(url).await {
                Ok(body) => return Ok(body),
                Err((kind, message)) => {
                    log::warn!(
                        "Fetch attempt {}/{} failed for {}: {}",
                        attempt,
                        self.config.max_attempts,
                        url,
                        message
                    );
                    last_failure = message;
                    kind
                }
            };

            if attempt < self.config.max_attempts {
                let delay = backoff_delay(kind, attempt, &self.config);
                log::info!("Retrying in {}s", delay.as_secs());
                tokio::time::sleep(delay).await;
            }
        }

        Err(AppError::Fetch {
            url: url.to_string(),
            attempts: self.config.max_attempts,
            message: last_failure,
        })
    }

    /// One fetch attempt; classifies failures for backoff selection.
    async fn try_fetch(&self, url: &str) -> std::result::Result<String, (FailureKind, String)> {
        let response = self
            .client
            .get(url)
            .header(
                "accept",
                "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8",
            )
            .send()
            .await
            .map_err(|e| (FailureKind::Other, format!("request error: {e}")))?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Err((FailureKind::RateLimited, format!("rate limited: {status}")));
        }
        if !status.is_success() {
            return Err((FailureKind::Other, format!("HTTP status {status}")));
        }

        let body = response
            .text()
            .await
            .map_err(|e| (FailureKind::Other, format!("body read error: {e}")))?;

        if body.trim().is_empty() {
            return Err((FailureKind::Other, "empty response body".to_string()));
        }

        Ok(body)
    }
}

/// Delay before the retry that follows failed attempt `attempt`.
///
/// Rate limiting escalates: a short first backoff, then the longer one for
/// every subsequent retry. Ordinary failures use a fixed short delay.
fn backoff_delay(kind: FailureKind, attempt: u32, config: &FetcherConfig) -> Duration {
    let secs = match kind {
        FailureKind::RateLimited if attempt == 1 => config.rate_limit_backoff_secs,
        FailureKind::RateLimited => config.rate_limit_backoff_max_secs,
        FailureKind::Other => config.retry_delay_secs,
    };
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_backoff_escalates() {
        let config = FetcherConfig::default();
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 1, &config),
            Duration::from_secs(10)
        );
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 2, &config),
            Duration::from_secs(30)
        );
        assert_eq!(
            backoff_delay(FailureKind::RateLimited, 3, &config),
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_ordinary_failure_uses_fixed_delay() {
        let config = FetcherConfig::default();
        assert_eq!(
            backoff_delay(FailureKind::Other, 1, &config),
            Duration::from_secs(7)
        );
        assert_eq!(
            backoff_delay(FailureKind::Other, 2, &config),
            Duration::from_secs(7)
        );
    }
}
