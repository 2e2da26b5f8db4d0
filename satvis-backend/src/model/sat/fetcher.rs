///! HTTP client for TLE sources (CelesTrak text endpoints)
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;

use super::parser::parse_tle_text;
use super::types::{SatelliteRecord, TleSourceConfig};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY_SECONDS: u64 = 2;
const REQUEST_TIMEOUT_SECONDS: u64 = 60;

/// Where element sets come from.
///
/// The manager only sees this trait, so tests can feed canned text.
#[async_trait]
pub trait TleFetcher: Send + Sync {
    /// Fetch and parse every element set published by `source`
    async fn fetch(&self, source: &TleSourceConfig) -> Result<Vec<SatelliteRecord>>;
}

/// reqwest-backed fetcher with retry
pub struct HttpTleFetcher {
    client: reqwest::Client,
}

impl HttpTleFetcher {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .user_agent(concat!("satvis/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { client })
    }

    async fn fetch_attempt(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{} returned HTTP {}", url, status);
        }

        response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))
    }
}

#[async_trait]
impl TleFetcher for HttpTleFetcher {
    async fn fetch(&self, source: &TleSourceConfig) -> Result<Vec<SatelliteRecord>> {
        for attempt in 1..=MAX_RETRIES {
            if attempt > 1 {
                let delay = Duration::from_secs(RETRY_DELAY_SECONDS * attempt as u64);
                tracing::debug!(
                    "Retrying {} after {:?} (attempt {}/{})",
                    source.url,
                    delay,
                    attempt,
                    MAX_RETRIES
                );
                tokio::time::sleep(delay).await;
            }

            match self.fetch_attempt(&source.url).await {
                Ok(body) => {
                    let records = parse_tle_text(&body, source.category);
                    if records.is_empty() {
                        anyhow::bail!("{} returned no element sets", source.url);
                    }
                    tracing::debug!("Fetched {} element sets from {}", records.len(), source.url);
                    return Ok(records);
                }
                Err(e) if attempt == MAX_RETRIES => {
                    tracing::error!(
                        "Failed to fetch {} after {} attempts: {}",
                        source.url,
                        MAX_RETRIES,
                        e
                    );
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(
                        "Attempt {}/{} failed for {}: {}",
                        attempt,
                        MAX_RETRIES,
                        source.url,
                        e
                    );
                }
            }
        }

        Err(anyhow::anyhow!(
            "Failed to fetch {} after {} attempts",
            source.url,
            MAX_RETRIES
        ))
    }
}
