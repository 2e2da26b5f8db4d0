//! Fixtures shared by unit tests across modules
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use satvis_common::{SatelliteCategory, SatelliteSummary, Transmitter, TransmitterStatus};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::model::sat::{
    SatelliteDirectory, SatelliteRecord, TleFetcher, TleSourceConfig, TransmitterFetcher,
    normalize_id,
};
use crate::module::visibility::TwoLineElements;

pub const ISS_LINE1: &str =
    "1 25544U 98067A   08264.51782528 -.00002182  00000-0 -11606-4 0  2927";
pub const ISS_LINE2: &str =
    "2 25544  51.6416 247.4627 0006703 130.5360 325.0288 15.72125391563537";

pub fn iss_tle() -> TwoLineElements {
    TwoLineElements::new(ISS_LINE1, ISS_LINE2)
}

/// An hour after the ISS element epoch
pub fn near_epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2008, 9, 20, 13, 0, 0).unwrap()
}

/// Directory over a fixed list of records
pub struct FixedDirectory(pub Vec<SatelliteRecord>);

impl FixedDirectory {
    pub fn with_iss() -> Self {
        Self(vec![
            SatelliteRecord::new("25544U", "ISS (ZARYA)", SatelliteCategory::Amateur, ISS_LINE1, ISS_LINE2),
            SatelliteRecord::new("11111", "NO ELEMENTS", SatelliteCategory::Other, "", ""),
            SatelliteRecord::new("22222", "GARBLED", SatelliteCategory::Weather, "1 22222U xx", "2 22222 yy"),
        ])
    }
}

#[async_trait]
impl SatelliteDirectory for FixedDirectory {
    async fn find(&self, id: &str) -> Option<SatelliteRecord> {
        let key = normalize_id(id);
        self.0.iter().find(|r| r.key() == key).cloned()
    }

    async fn list(&self, category: Option<SatelliteCategory>) -> Vec<SatelliteSummary> {
        self.0
            .iter()
            .filter(|r| category.is_none_or(|c| r.category == c))
            .map(SatelliteRecord::to_summary)
            .collect()
    }

    async fn search(&self, query: &str) -> Vec<SatelliteSummary> {
        let query = query.to_lowercase();
        self.0
            .iter()
            .filter(|r| r.name.to_lowercase().contains(&query))
            .map(SatelliteRecord::to_summary)
            .collect()
    }

    async fn last_update(&self) -> Option<DateTime<Utc>> {
        Some(Utc.with_ymd_and_hms(2008, 9, 20, 12, 0, 0).unwrap())
    }

    /// Transmitters never fetched
    async fn transmitters_last_update(&self) -> Option<DateTime<Utc>> {
        None
    }
}

/// Fetcher serving canned records per URL; unknown URLs fail
pub struct StaticFetcher {
    responses: Mutex<HashMap<String, Vec<SatelliteRecord>>>,
}

impl StaticFetcher {
    pub fn new(responses: Vec<(&str, Vec<SatelliteRecord>)>) -> Self {
        Self {
            responses: Mutex::new(
                responses
                    .into_iter()
                    .map(|(url, records)| (url.to_string(), records))
                    .collect(),
            ),
        }
    }

    pub fn set(&self, url: &str, records: Option<Vec<SatelliteRecord>>) {
        let mut responses = self.responses.lock().unwrap();
        match records {
            Some(records) => responses.insert(url.to_string(), records),
            None => responses.remove(url),
        };
    }
}

#[async_trait]
impl TleFetcher for StaticFetcher {
    async fn fetch(&self, source: &TleSourceConfig) -> Result<Vec<SatelliteRecord>> {
        self.responses
            .lock()
            .unwrap()
            .get(&source.url)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("connection refused"))
    }
}

/// Transmitter lists per NORAD number; unknown numbers fail
pub struct StaticTransmitterFetcher {
    responses: HashMap<u32, Vec<Transmitter>>,
}

impl StaticTransmitterFetcher {
    pub fn new(responses: Vec<(u32, Vec<Transmitter>)>) -> Self {
        Self {
            responses: responses.into_iter().collect(),
        }
    }
}

#[async_trait]
impl TransmitterFetcher for StaticTransmitterFetcher {
    async fn fetch(&self, norad_id: u32) -> Result<Vec<Transmitter>> {
        self.responses
            .get(&norad_id)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("HTTP 404"))
    }
}

/// Active FSK beacon on `downlink`
pub fn beacon(downlink: &str) -> Transmitter {
    Transmitter {
        description: "Telemetry beacon".to_string(),
        mode: Some("FSK".to_string()),
        status: TransmitterStatus::Active,
        uplink: None,
        downlink: Some(downlink.to_string()),
    }
}
