//! Pass listing over a time window
use chrono::{DateTime, Duration, Utc};
use satvis_common::PassResponse;

use super::calculator::LookAngleSource;
use super::geo::round_one_decimal;
use crate::error::{Result, VisibilityError};

/// One interval with the satellite above the elevation threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pass {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub max_elevation_deg: f64,
}

impl Pass {
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn to_response(&self) -> PassResponse {
        PassResponse {
            start_time: self.start.to_rfc3339(),
            end_time: self.end.to_rfc3339(),
            max_elevation: round_one_decimal(self.max_elevation_deg),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// A pass needs elevation strictly above this
    pub min_elevation_deg: f64,
    pub step_seconds: u32,
}

impl PassWindow {
    /// 24 hours from `start`, sampled every minute, above the horizon
    pub fn day_from(start: DateTime<Utc>) -> Self {
        Self {
            start,
            end: start + Duration::hours(24),
            min_elevation_deg: 0.0,
            step_seconds: 60,
        }
    }
}

/// Sample the window and group consecutive samples above the threshold.
///
/// Pass boundaries are only as precise as `step_seconds`: a pass starts at
/// its first sample above the threshold and ends at its last one. Gaps in
/// propagation are skipped without closing an open pass.
pub fn predict_passes<S: LookAngleSource + ?Sized>(
    source: &S,
    window: &PassWindow,
) -> Result<Vec<Pass>> {
    if window.step_seconds == 0 {
        return Err(VisibilityError::InvalidRequest(
            "Pass step must be at least one second".to_string(),
        ));
    }
    if window.end < window.start {
        return Err(VisibilityError::InvalidRequest(
            "Pass window ends before it starts".to_string(),
        ));
    }

    let step = Duration::seconds(i64::from(window.step_seconds));
    let mut passes = Vec::new();
    let mut current: Option<Pass> = None;

    let mut t = window.start;
    while t <= window.end {
        if let Some(look) = source.look_angles_at(t)? {
            if look.elevation_deg > window.min_elevation_deg {
                match current.as_mut() {
                    Some(pass) => {
                        pass.end = t;
                        pass.max_elevation_deg = pass.max_elevation_deg.max(look.elevation_deg);
                    }
                    None => {
                        current = Some(Pass {
                            start: t,
                            end: t,
                            max_elevation_deg: look.elevation_deg,
                        });
                    }
                }
            } else if let Some(pass) = current.take() {
                passes.push(pass);
            }
        }
        t += step;
    }

    if let Some(pass) = current {
        passes.push(pass);
    }

    tracing::debug!(
        "Found {} passes between {} and {}",
        passes.len(),
        window.start,
        window.end
    );
    Ok(passes)
}
