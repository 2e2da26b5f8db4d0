//! Current look angles and the combined visibility report

use chrono::{DateTime, Utc};
use satvis_common::VisibilityResponse;

use super::events::{NextEvents, SearchConfig, find_next_events};
use super::geo::{LookAngles, Observer, eci_to_look_angles, format_azimuth, format_elevation};
use super::propagator::{Propagator, Sgp4Propagator, TwoLineElements};
use crate::error::Result;

/// Source of look angles over time for one satellite/observer pair.
///
/// `Ok(None)` is a propagation gap, `Err` a real fault.
pub trait LookAngleSource {
    fn look_angles_at(&self, t: DateTime<Utc>) -> Result<Option<LookAngles>>;
}

/// A propagator bound to an observer
pub struct Tracker<P> {
    propagator: P,
    observer: Observer,
}

impl<P: Propagator> Tracker<P> {
    pub fn new(propagator: P, observer: Observer) -> Self {
        Self {
            propagator,
            observer,
        }
    }

    pub fn observer(&self) -> &Observer {
        &self.observer
    }
}

impl Tracker<Sgp4Propagator> {
    /// Parse the elements and bind them to `observer`
    pub fn from_tle(elements: &TwoLineElements, observer: Observer) -> Result<Self> {
        Ok(Self::new(Sgp4Propagator::from_tle(elements)?, observer))
    }
}

impl<P: Propagator> LookAngleSource for Tracker<P> {
    fn look_angles_at(&self, t: DateTime<Utc>) -> Result<Option<LookAngles>> {
        match self.propagator.propagate(t) {
            Some(state) => eci_to_look_angles(&self.observer, state.position_km, t).map(Some),
            None => Ok(None),
        }
    }
}

/// Outcome of the look-angle computation at one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visibility {
    Observable(LookAngles),
    /// The propagator produced no position; a valid physical outcome
    NotObservable,
}

impl Visibility {
    pub fn look_angles(&self) -> Option<&LookAngles> {
        match self {
            Visibility::Observable(look) => Some(look),
            Visibility::NotObservable => None,
        }
    }
}

/// Look angles of `source` at `now`
pub fn current_visibility<S: LookAngleSource + ?Sized>(
    source: &S,
    now: DateTime<Utc>,
) -> Result<Visibility> {
    Ok(match source.look_angles_at(now)? {
        Some(look) => Visibility::Observable(look),
        None => Visibility::NotObservable,
    })
}

/// Azimuth/elevation of the satellite for `observer` at `now`
pub fn compute_current_look_angles(
    elements: &TwoLineElements,
    observer: &Observer,
    now: DateTime<Utc>,
) -> Result<Visibility> {
    let tracker = Tracker::from_tle(elements, *observer)?;
    current_visibility(&tracker, now)
}

/// Countdowns to the next AOS/LOS, using the default 90-minute scan
pub fn compute_next_events(
    elements: &TwoLineElements,
    observer: &Observer,
    now: DateTime<Utc>,
) -> Result<NextEvents> {
    let tracker = Tracker::from_tle(elements, *observer)?;
    find_next_events(&tracker, now, &SearchConfig::default())
}

/// Look angles plus event countdowns for one query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibilityReport {
    pub visibility: Visibility,
    pub events: NextEvents,
}

impl VisibilityReport {
    pub fn not_observable() -> Self {
        Self {
            visibility: Visibility::NotObservable,
            events: NextEvents::none(),
        }
    }

    /// Wire form, with angles rounded to one decimal
    pub fn to_response(&self) -> VisibilityResponse {
        match self.visibility {
            Visibility::Observable(look) => VisibilityResponse {
                azimuth: format_azimuth(look.azimuth_deg),
                elevation: format_elevation(look.elevation_deg),
                next_aos_countdown: self.events.next_aos_countdown,
                next_los_countdown: self.events.next_los_countdown,
            },
            Visibility::NotObservable => VisibilityResponse::not_observable(),
        }
    }
}

/// Stateless calculator carrying the event search settings
#[derive(Debug, Clone, Copy, Default)]
pub struct VisibilityCalculator {
    search: SearchConfig,
}

impl VisibilityCalculator {
    pub fn new(search: SearchConfig) -> Self {
        Self { search }
    }

    pub fn search_config(&self) -> &SearchConfig {
        &self.search
    }

    /// Full report for a TLE and observer
    pub fn evaluate(
        &self,
        elements: &TwoLineElements,
        observer: &Observer,
        now: DateTime<Utc>,
    ) -> Result<VisibilityReport> {
        let tracker = Tracker::from_tle(elements, *observer)?;
        self.evaluate_source(&tracker, now)
    }

    /// Full report for any look-angle source
    pub fn evaluate_source<S: LookAngleSource + ?Sized>(
        &self,
        source: &S,
        now: DateTime<Utc>,
    ) -> Result<VisibilityReport> {
        let visibility = current_visibility(source, now)?;
        if visibility == Visibility::NotObservable {
            return Ok(VisibilityReport::not_observable());
        }

        let events = find_next_events(source, now, &self.search)?;
        Ok(VisibilityReport { visibility, events })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::VisibilityError;
    use crate::module::visibility::geo::{eci_to_ecf, gmst_rad};
    use crate::module::visibility::propagator::StateVector;
    use crate::test_support::iss_tle;
    use chrono::{Duration, TimeZone};

    /// Propagator parked straight above a ground point, compensating for
    /// Earth rotation so it stays fixed in the sky.
    struct Geostationary {
        ecf_km: [f64; 3],
    }

    impl Propagator for Geostationary {
        fn propagate(&self, t: DateTime<Utc>) -> Option<StateVector> {
            // ECF -> ECI is the inverse rotation
            let eci = eci_to_ecf(self.ecf_km, -gmst_rad(t));
            Some(StateVector {
                position_km: eci,
                velocity_km_s: [0.0; 3],
            })
        }
    }

    struct Decayed;

    impl Propagator for Decayed {
        fn propagate(&self, _t: DateTime<Utc>) -> Option<StateVector> {
            None
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2008, 9, 20, 13, 0, 0).unwrap()
    }

    #[test]
    fn test_tracker_overhead_satellite() {
        let observer = Observer::default();
        let tracker = Tracker::new(
            Geostationary {
                ecf_km: [6378.137 + 400.0, 0.0, 0.0],
            },
            observer,
        );

        let look = tracker.look_angles_at(now()).unwrap().unwrap();
        assert!((look.elevation_deg - 90.0).abs() < 1e-6);
        assert!((look.range_km - 400.0).abs() < 1e-6);
    }

    #[test]
    fn test_not_observable_sentinel() {
        let tracker = Tracker::new(Decayed, Observer::default());
        let report = VisibilityCalculator::default()
            .evaluate_source(&tracker, now())
            .unwrap();

        assert_eq!(report, VisibilityReport::not_observable());
        assert_eq!(report.to_response(), VisibilityResponse::not_observable());
    }

    #[test]
    fn test_look_angles_ranges_for_real_tle() {
        let observer = Observer::new(48.85, 2.35, 35.0).unwrap();
        for minutes in [0, 17, 45, 90, 600] {
            let t = now() + Duration::minutes(minutes);
            match compute_current_look_angles(&iss_tle(), &observer, t).unwrap() {
                Visibility::Observable(look) => {
                    assert!((-90.0..=90.0).contains(&look.elevation_deg));
                    assert!((0.0..360.0).contains(&look.azimuth_deg));
                }
                Visibility::NotObservable => panic!("ISS should propagate near its epoch"),
            }
        }
    }

    #[test]
    fn test_events_within_horizon_for_real_tle() {
        let observer = Observer::new(-33.9, 18.4, 0.0).unwrap();
        let events = compute_next_events(&iss_tle(), &observer, now()).unwrap();

        for countdown in [events.next_aos_countdown, events.next_los_countdown] {
            assert!(countdown == -1 || (0..=5399).contains(&countdown));
        }
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let observer = Observer::new(35.68, 139.69, 40.0).unwrap();
        let calculator = VisibilityCalculator::default();
        let first = calculator.evaluate(&iss_tle(), &observer, now()).unwrap();
        let second = calculator.evaluate(&iss_tle(), &observer, now()).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.to_response(), second.to_response());
    }

    #[test]
    fn test_evaluate_rejects_malformed_elements() {
        let bad = TwoLineElements::new("1 25544U", "");
        let result = VisibilityCalculator::default().evaluate(&bad, &Observer::default(), now());
        assert!(matches!(result, Err(VisibilityError::MalformedElements(_))));
    }

    #[test]
    fn test_response_formatting() {
        let report = VisibilityReport {
            visibility: Visibility::Observable(LookAngles {
                azimuth_deg: 123.456,
                elevation_deg: 12.349,
                range_km: 900.0,
            }),
            events: NextEvents {
                next_aos_countdown: -1,
                next_los_countdown: 512,
            },
        };
        let response = report.to_response();
        assert_eq!(response.azimuth, "123.5");
        assert_eq!(response.elevation, "12.3");
        assert_eq!(response.next_los_countdown, 512);
    }
}
