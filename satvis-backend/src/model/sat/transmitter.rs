///! SatNOGS transmitter metadata
///!
///! Per-satellite transmitter lists from the SatNOGS DB API, mapped onto
///! the `Transmitter` wire type stored with each catalog record.
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use satvis_common::{Transmitter, TransmitterStatus};

pub const DEFAULT_TRANSMITTER_API_URL: &str = "https://db.satnogs.org/api/transmitters/";

const REQUEST_TIMEOUT_SECONDS: u64 = 30;

/// Transmitter entry as returned by SatNOGS
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct SatnogsTransmitter {
    description: Option<String>,
    mode: Option<String>,
    alive: bool,
    uplink_low: Option<u64>,
    uplink_high: Option<u64>,
    downlink_low: Option<u64>,
    downlink_high: Option<u64>,
}

/// Plain list, or a paginated `{results: [...]}` page
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SatnogsResponse {
    List(Vec<SatnogsTransmitter>),
    Page {
        #[serde(default)]
        results: Vec<SatnogsTransmitter>,
    },
}

impl SatnogsResponse {
    fn into_transmitters(self) -> Vec<Transmitter> {
        let raw = match self {
            SatnogsResponse::List(list) => list,
            SatnogsResponse::Page { results } => results,
        };
        raw.into_iter().map(Transmitter::from).collect()
    }
}

impl From<SatnogsTransmitter> for Transmitter {
    fn from(raw: SatnogsTransmitter) -> Self {
        let mode = raw.mode.filter(|m| !m.trim().is_empty());
        let description = match (raw.description.filter(|d| !d.trim().is_empty()), &mode) {
            (Some(description), _) => description,
            (None, Some(mode)) => format!("Mode {} Beacon", mode),
            (None, None) => String::new(),
        };

        Transmitter {
            description,
            mode,
            status: if raw.alive {
                TransmitterStatus::Active
            } else {
                TransmitterStatus::Inactive
            },
            uplink: frequency_range(raw.uplink_low, raw.uplink_high),
            downlink: frequency_range(raw.downlink_low, raw.downlink_high),
        }
    }
}

/// `low-high`, or `low` alone; nothing without a usable low edge
fn frequency_range(low: Option<u64>, high: Option<u64>) -> Option<String> {
    match (low.filter(|f| *f > 0), high.filter(|f| *f > 0)) {
        (Some(low), Some(high)) => Some(format!("{}-{}", low, high)),
        (Some(low), None) => Some(low.to_string()),
        (None, _) => None,
    }
}

/// Parse a SatNOGS transmitters response body
pub fn parse_transmitters(body: &str) -> Result<Vec<Transmitter>> {
    let response: SatnogsResponse =
        serde_json::from_str(body).context("Unexpected transmitter response shape")?;
    Ok(response.into_transmitters())
}

/// Where transmitter lists come from
#[async_trait]
pub trait TransmitterFetcher: Send + Sync {
    async fn fetch(&self, norad_id: u32) -> Result<Vec<Transmitter>>;
}

/// reqwest-backed SatNOGS DB client
pub struct SatnogsTransmitterFetcher {
    client: reqwest::Client,
    api_url: String,
}

impl SatnogsTransmitterFetcher {
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECONDS))
            .user_agent(concat!("satvis/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            api_url: api_url.into(),
        })
    }
}

fn transmitters_url(api_url: &str, norad_id: u32) -> String {
    format!("{}?satellite__norad_cat_id={}", api_url, norad_id)
}

#[async_trait]
impl TransmitterFetcher for SatnogsTransmitterFetcher {
    async fn fetch(&self, norad_id: u32) -> Result<Vec<Transmitter>> {
        let url = transmitters_url(&self.api_url, norad_id);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("{} returned HTTP {}", url, status);
        }

        let body = response
            .text()
            .await
            .with_context(|| format!("Failed to read body from {}", url))?;
        let transmitters = parse_transmitters(&body)?;
        tracing::debug!("NORAD {}: {} transmitters", norad_id, transmitters.len());
        Ok(transmitters)
    }
}
