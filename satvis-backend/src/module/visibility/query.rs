///! Request-level orchestration: directory lookup, validation, then the
///! calculator on a blocking worker.
use chrono::{DateTime, Duration, Utc};
use satvis_common::{PassListResponse, VisibilityResponse};

use super::calculator::{Tracker, VisibilityCalculator};
use super::geo::Observer;
use super::passes::{PassWindow, predict_passes};
use super::propagator::TwoLineElements;
use crate::error::{Result, VisibilityError};
use crate::model::sat::SatelliteDirectory;

/// Raw query inputs; everything but the identifier is optional
#[derive(Debug, Clone, Default)]
pub struct VisibilityRequest {
    pub sat_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub height: Option<f64>,
}

impl VisibilityRequest {
    /// Trimmed identifier, or `InvalidRequest`
    pub fn identifier(&self) -> Result<&str> {
        match self.sat_id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(VisibilityError::InvalidRequest(
                "satId param required".to_string(),
            )),
        }
    }

    /// Observer with missing coordinates defaulting to 0
    pub fn observer(&self) -> Result<Observer> {
        Observer::new(
            self.latitude.unwrap_or(0.0),
            self.longitude.unwrap_or(0.0),
            self.height.unwrap_or(0.0),
        )
    }
}

/// Options of the pass listing on top of a visibility request
#[derive(Debug, Clone, Copy)]
pub struct PassQuery {
    pub window_hours: u32,
    pub min_elevation_deg: f64,
    pub step_seconds: u32,
}

impl Default for PassQuery {
    fn default() -> Self {
        Self {
            window_hours: 24,
            min_elevation_deg: 0.0,
            step_seconds: 60,
        }
    }
}

/// Resolve the identifier to orbital elements
async fn resolve_elements(
    directory: &dyn SatelliteDirectory,
    request: &VisibilityRequest,
) -> Result<(String, TwoLineElements)> {
    let id = request.identifier()?;

    let record = directory.find(id).await;
    let elements = record.as_ref().and_then(|r| r.elements()).ok_or_else(|| {
        VisibilityError::NotFound(format!("TLE not found for satellite: {}", id))
    })?;

    Ok((id.to_string(), elements))
}

/// Visibility of a catalog satellite for the requested observer at `now`
pub async fn query_visibility(
    directory: &dyn SatelliteDirectory,
    calculator: VisibilityCalculator,
    request: &VisibilityRequest,
    now: DateTime<Utc>,
) -> Result<VisibilityResponse> {
    request.identifier()?;
    let observer = request.observer()?;
    let (id, elements) = resolve_elements(directory, request).await?;

    // up to 5400 propagations; keep them off the async workers
    let report = tokio::task::spawn_blocking(move || calculator.evaluate(&elements, &observer, now))
        .await
        .map_err(|e| VisibilityError::Internal(e.into()))??;

    tracing::debug!("Visibility of {} for {:?}: {:?}", id, observer, report);
    Ok(report.to_response())
}

/// Passes of a catalog satellite over the next `query.window_hours`
pub async fn query_passes(
    directory: &dyn SatelliteDirectory,
    request: &VisibilityRequest,
    query: PassQuery,
    now: DateTime<Utc>,
) -> Result<PassListResponse> {
    if query.window_hours == 0 || query.window_hours > 24 * 7 {
        return Err(VisibilityError::InvalidRequest(
            "hours must be between 1 and 168".to_string(),
        ));
    }
    if !query.min_elevation_deg.is_finite() || !(-90.0..=90.0).contains(&query.min_elevation_deg) {
        return Err(VisibilityError::InvalidRequest(
            "minElevation must be within [-90, 90]".to_string(),
        ));
    }

    request.identifier()?;
    let observer = request.observer()?;
    let (id, elements) = resolve_elements(directory, request).await?;
    let window = PassWindow {
        start: now,
        end: now + Duration::hours(i64::from(query.window_hours)),
        min_elevation_deg: query.min_elevation_deg,
        step_seconds: query.step_seconds,
    };

    let passes = tokio::task::spawn_blocking(move || {
        let tracker = Tracker::from_tle(&elements, observer)?;
        predict_passes(&tracker, &window)
    })
    .await
    .map_err(|e| VisibilityError::Internal(e.into()))??;

    Ok(PassListResponse {
        satellite_id: id,
        passes: passes.iter().map(|pass| pass.to_response()).collect(),
    })
}
