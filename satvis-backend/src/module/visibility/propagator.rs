//! SGP4 propagation of two-line element sets

use chrono::{DateTime, Utc};

use crate::error::{Result, VisibilityError};

/// Raw two-line element set, as stored in the catalog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TwoLineElements {
    pub line1: String,
    pub line2: String,
}

impl TwoLineElements {
    pub fn new(line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self {
            line1: line1.into(),
            line2: line2.into(),
        }
    }
}

/// Position/velocity in the TEME inertial frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateVector {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
}

/// Anything that can place a satellite in the inertial frame at an instant.
///
/// `None` means the model produced no usable position for that instant
/// (decayed orbit, numerical breakdown); callers treat it as a gap.
pub trait Propagator {
    fn propagate(&self, t: DateTime<Utc>) -> Option<StateVector>;
}

/// SGP4/SDP4 model built from a TLE
pub struct Sgp4Propagator {
    constants: sgp4::Constants,
    epoch: DateTime<Utc>,
}

impl Sgp4Propagator {
    /// Decode both TLE lines, failing fast on anything malformed
    pub fn from_tle(tle: &TwoLineElements) -> Result<Self> {
        let line1 = tle.line1.trim();
        let line2 = tle.line2.trim();
        if line1.is_empty() || line2.is_empty() {
            return Err(VisibilityError::MalformedElements(
                "both TLE lines are required".to_string(),
            ));
        }

        let elements = sgp4::Elements::from_tle(None, line1.as_bytes(), line2.as_bytes())
            .map_err(|e| VisibilityError::MalformedElements(e.to_string()))?;
        let constants = sgp4::Constants::from_elements(&elements)
            .map_err(|e| VisibilityError::MalformedElements(e.to_string()))?;
        let epoch = elements.datetime.and_utc();

        Ok(Self { constants, epoch })
    }

    pub fn epoch(&self) -> DateTime<Utc> {
        self.epoch
    }
}

impl Propagator for Sgp4Propagator {
    fn propagate(&self, t: DateTime<Utc>) -> Option<StateVector> {
        let minutes = minutes_since_epoch(t, self.epoch);
        match self.constants.propagate(sgp4::MinutesSinceEpoch(minutes)) {
            Ok(prediction) => {
                let finite = prediction
                    .position
                    .iter()
                    .chain(prediction.velocity.iter())
                    .all(|v| v.is_finite());
                if !finite {
                    tracing::debug!("SGP4 returned non-finite state at {}", t);
                    return None;
                }
                Some(StateVector {
                    position_km: prediction.position,
                    velocity_km_s: prediction.velocity,
                })
            }
            Err(e) => {
                tracing::debug!("SGP4 propagation gap at {}: {}", t, e);
                None
            }
        }
    }
}

/// Minutes between the element epoch and `t`
pub fn minutes_since_epoch(t: DateTime<Utc>, epoch: DateTime<Utc>) -> f64 {
    let delta = t - epoch;
    delta.num_seconds() as f64 / 60.0 + (delta.subsec_nanos() as f64) / 60.0 / 1.0e9
}
