use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use satvis_common::{SatelliteCategory, SatelliteDetail, SatelliteSummary, Transmitter};

use crate::module::visibility::TwoLineElements;

/// Catalog entry: identity plus the latest two-line elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteRecord {
    /// Catalog number and classification as printed in line 1 (`25544U`)
    pub id: String,

    pub name: String,

    #[serde(default)]
    pub category: SatelliteCategory,

    #[serde(default)]
    pub tle1: String,

    #[serde(default)]
    pub tle2: String,

    /// From SatNOGS, refreshed separately from the elements
    #[serde(default)]
    pub transmitters: Vec<Transmitter>,
}

impl SatelliteRecord {
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        category: SatelliteCategory,
        tle1: impl Into<String>,
        tle2: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            tle1: tle1.into(),
            tle2: tle2.into(),
            transmitters: Vec::new(),
        }
    }

    /// Normalized lookup key (trimmed, upper-case)
    pub fn key(&self) -> String {
        normalize_id(&self.id)
    }

    /// NORAD catalog number, if the id is numeric apart from the
    /// classification letter
    pub fn norad_id(&self) -> Option<u32> {
        self.key().parse().ok()
    }

    /// Elements if both lines are present
    pub fn elements(&self) -> Option<TwoLineElements> {
        let line1 = self.tle1.trim();
        let line2 = self.tle2.trim();
        if line1.is_empty() || line2.is_empty() {
            return None;
        }
        Some(TwoLineElements::new(line1, line2))
    }

    pub fn to_summary(&self) -> SatelliteSummary {
        SatelliteSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category,
        }
    }

    pub fn to_detail(&self) -> SatelliteDetail {
        SatelliteDetail {
            id: self.id.clone(),
            name: self.name.clone(),
            category: self.category,
            tle1: self.tle1.clone(),
            tle2: self.tle2.clone(),
            transmitters: self.transmitters.clone(),
        }
    }
}

/// Lookup key for an identifier.
///
/// Trimmed and upper-cased; a classification letter after a numeric catalog
/// number is dropped so `25544U` and `25544` name the same satellite.
pub fn normalize_id(id: &str) -> String {
    let id = id.trim().to_uppercase();
    match id.char_indices().last() {
        Some((idx, last))
            if idx > 0
                && last.is_ascii_alphabetic()
                && id[..idx].bytes().all(|b| b.is_ascii_digit()) =>
        {
            id[..idx].to_string()
        }
        _ => id,
    }
}

/// On-disk catalog format
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    /// Time of the last successful refresh
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub satellites: Vec<SatelliteRecord>,

    /// Time of the last transmitter refresh
    #[serde(default)]
    pub transmitters_updated_at: Option<DateTime<Utc>>,
}

/// One element-set source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TleSourceConfig {
    pub url: String,
    #[serde(default)]
    pub category: SatelliteCategory,
}

/// CelesTrak groups used by default
pub fn default_sources() -> Vec<TleSourceConfig> {
    vec![
        TleSourceConfig {
            url: "https://celestrak.org/NORAD/elements/amateur.txt".to_string(),
            category: SatelliteCategory::Amateur,
        },
        TleSourceConfig {
            url: "https://celestrak.org/NORAD/elements/weather.txt".to_string(),
            category: SatelliteCategory::Weather,
        },
    ]
}

/// Result of a catalog refresh
#[derive(Debug, Clone, Default)]
pub struct UpdateReport {
    pub total_satellites: usize,
    pub successful_sources: usize,
    pub failed_sources: Vec<String>,
    pub new_satellites: Vec<String>,
    pub duration_seconds: f64,
}

/// Result of a transmitter refresh
#[derive(Debug, Clone, Default)]
pub struct TransmitterReport {
    pub checked: usize,
    pub changed: usize,
    pub failed: Vec<String>,
    pub duration_seconds: f64,
}
