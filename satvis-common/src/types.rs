use serde::{Deserialize, Serialize};

/// Placeholder used for angles when the satellite cannot be observed
pub const NOT_AVAILABLE: &str = "N/A";

/// Countdown value meaning "no event within the search horizon"
pub const NO_EVENT: i64 = -1;

/// Satellite category, matching the catalog source groups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SatelliteCategory {
    #[serde(rename = "amateur")]
    Amateur,
    #[serde(rename = "weather")]
    Weather,
    #[default]
    #[serde(rename = "other")]
    Other,
}

impl SatelliteCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            SatelliteCategory::Amateur => "amateur",
            SatelliteCategory::Weather => "weather",
            SatelliteCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for SatelliteCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for SatelliteCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "amateur" | "radio" => Ok(SatelliteCategory::Amateur),
            "weather" => Ok(SatelliteCategory::Weather),
            "other" => Ok(SatelliteCategory::Other),
            _ => Err(format!("Unknown satellite category: {}", s)),
        }
    }
}

/// Response of the visibility query.
///
/// Angles are strings with one decimal, or `"N/A"` when the satellite
/// could not be propagated at the query instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisibilityResponse {
    pub azimuth: String,
    pub elevation: String,
    #[serde(rename = "nextAOSCountdown")]
    pub next_aos_countdown: i64,
    #[serde(rename = "nextLOSCountdown")]
    pub next_los_countdown: i64,
}

impl VisibilityResponse {
    /// The "not observable" sentinel
    pub fn not_observable() -> Self {
        Self {
            azimuth: NOT_AVAILABLE.to_string(),
            elevation: NOT_AVAILABLE.to_string(),
            next_aos_countdown: NO_EVENT,
            next_los_countdown: NO_EVENT,
        }
    }

    pub fn is_observable(&self) -> bool {
        self.azimuth != NOT_AVAILABLE && self.elevation != NOT_AVAILABLE
    }
}

/// Error body returned with every non-2xx status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

/// Catalog entry without orbital elements
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: SatelliteCategory,
}

/// Full catalog entry as served by `/api/satellite/{id}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteDetail {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub category: SatelliteCategory,
    pub tle1: String,
    pub tle2: String,
    #[serde(default)]
    pub transmitters: Vec<Transmitter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransmitterStatus {
    Active,
    Inactive,
}

/// Radio transmitter or transponder carried by a satellite.
///
/// Frequencies are in Hz, either a single value (`"145825000"`) or a
/// `low-high` range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transmitter {
    pub description: String,
    pub mode: Option<String>,
    pub status: TransmitterStatus,
    pub uplink: Option<String>,
    pub downlink: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastUpdateResponse {
    pub last_update: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Body of `/api/transponders-last-update`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranspondersLastUpdateResponse {
    pub updated_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// One predicted pass over the observer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassResponse {
    /// RFC 3339, UTC
    pub start_time: String,
    /// RFC 3339, UTC
    pub end_time: String,
    pub max_elevation: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PassListResponse {
    pub satellite_id: String,
    pub passes: Vec<PassResponse>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_wire_shape() {
        let json = serde_json::to_value(VisibilityResponse::not_observable()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "azimuth": "N/A",
                "elevation": "N/A",
                "nextAOSCountdown": -1,
                "nextLOSCountdown": -1,
            })
        );
    }

    #[test]
    fn test_visibility_response_is_observable() {
        let response = VisibilityResponse {
            azimuth: "120.5".to_string(),
            elevation: "-3.2".to_string(),
            next_aos_countdown: 42,
            next_los_countdown: NO_EVENT,
        };
        assert!(response.is_observable());
        assert!(!VisibilityResponse::not_observable().is_observable());
    }

    #[test]
    fn test_category_from_str() {
        assert_eq!("Weather".parse::<SatelliteCategory>(), Ok(SatelliteCategory::Weather));
        assert_eq!(" amateur ".parse::<SatelliteCategory>(), Ok(SatelliteCategory::Amateur));
        assert!("military".parse::<SatelliteCategory>().is_err());
    }

    #[test]
    fn test_last_update_omits_missing_error() {
        let json = serde_json::to_value(LastUpdateResponse {
            last_update: Some("2026-01-01T00:00:00Z".to_string()),
            error: None,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({ "lastUpdate": "2026-01-01T00:00:00Z" }));
    }

    #[test]
    fn test_transmitter_wire_shape() {
        let transmitter = Transmitter {
            description: "Mode V/U FM".to_string(),
            mode: Some("FM".to_string()),
            status: TransmitterStatus::Active,
            uplink: Some("145850000".to_string()),
            downlink: None,
        };
        assert_eq!(
            serde_json::to_value(&transmitter).unwrap(),
            serde_json::json!({
                "description": "Mode V/U FM",
                "mode": "FM",
                "status": "active",
                "uplink": "145850000",
                "downlink": null,
            })
        );

        let missing = TranspondersLastUpdateResponse {
            updated_at: None,
            error: Some("not yet".to_string()),
        };
        assert_eq!(
            serde_json::to_value(&missing).unwrap(),
            serde_json::json!({ "updated_at": null, "error": "not yet" })
        );
    }

    #[test]
    fn test_detail_without_transmitters() {
        let detail: SatelliteDetail = serde_json::from_str(
            r#"{"id":"25544U","name":"ISS","tle1":"1","tle2":"2"}"#,
        )
        .unwrap();
        assert!(detail.transmitters.is_empty());
    }
}
