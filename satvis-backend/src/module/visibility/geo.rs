//! Frame conversions between the inertial frame, the Earth-fixed frame and
//! the observer's local horizon.

use chrono::{DateTime, Utc};
use std::f64::consts::{PI, TAU};

use crate::error::{Result, VisibilityError};

/// WGS-84 semi-major axis (km)
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
/// WGS-84 semi-minor axis (km)
const EARTH_POLAR_RADIUS_KM: f64 = 6356.7523142;

const UNIX_EPOCH_JULIAN_DATE: f64 = 2_440_587.5;
const J2000_JULIAN_DATE: f64 = 2_451_545.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Observer on the ground.
///
/// Latitude/longitude are geodetic degrees, height is meters above the
/// ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub height_m: f64,
}

impl Observer {
    /// Build a validated observer
    pub fn new(latitude_deg: f64, longitude_deg: f64, height_m: f64) -> Result<Self> {
        if !latitude_deg.is_finite() || !(-90.0..=90.0).contains(&latitude_deg) {
            return Err(VisibilityError::InvalidRequest(format!(
                "Latitude must be within [-90, 90], got {}",
                latitude_deg
            )));
        }
        if !longitude_deg.is_finite() || !(-180.0..=180.0).contains(&longitude_deg) {
            return Err(VisibilityError::InvalidRequest(format!(
                "Longitude must be within [-180, 180], got {}",
                longitude_deg
            )));
        }
        if !height_m.is_finite() {
            return Err(VisibilityError::InvalidRequest(format!(
                "Height must be a finite number, got {}",
                height_m
            )));
        }

        Ok(Self {
            latitude_deg,
            longitude_deg,
            height_m,
        })
    }

    /// Observer on the ellipsoid surface
    pub fn at_sea_level(latitude_deg: f64, longitude_deg: f64) -> Result<Self> {
        Self::new(latitude_deg, longitude_deg, 0.0)
    }

    /// Earth-fixed position of the observer (km)
    pub fn to_ecf_km(&self) -> [f64; 3] {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        let height_km = self.height_m / 1000.0;

        let a = EARTH_EQUATORIAL_RADIUS_KM;
        let f = (a - EARTH_POLAR_RADIUS_KM) / a;
        let e2 = 2.0 * f - f * f;
        let normal = a / (1.0 - e2 * lat.sin().powi(2)).sqrt();

        [
            (normal + height_km) * lat.cos() * lon.cos(),
            (normal + height_km) * lat.cos() * lon.sin(),
            (normal * (1.0 - e2) + height_km) * lat.sin(),
        ]
    }
}

impl Default for Observer {
    fn default() -> Self {
        Self {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            height_m: 0.0,
        }
    }
}

/// Direction from the observer to the satellite
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    /// Degrees clockwise from north, in [0, 360)
    pub azimuth_deg: f64,
    /// Degrees above the horizon, in [-90, 90]
    pub elevation_deg: f64,
    pub range_km: f64,
}

impl LookAngles {
    pub fn is_above_horizon(&self) -> bool {
        self.elevation_deg > 0.0
    }
}

/// Julian date (UT1 approximated by UTC)
pub fn julian_date(t: DateTime<Utc>) -> f64 {
    let secs = t.timestamp() as f64 + (t.timestamp_subsec_nanos() as f64) * 1e-9;
    secs / SECONDS_PER_DAY + UNIX_EPOCH_JULIAN_DATE
}

/// Greenwich Mean Sidereal Time in radians, IAU-82 model
pub fn gmst_rad(t: DateTime<Utc>) -> f64 {
    let tut1 = (julian_date(t) - J2000_JULIAN_DATE) / 36_525.0;
    let seconds = -6.2e-6 * tut1.powi(3)
        + 0.093104 * tut1.powi(2)
        + (876_600.0 * 3600.0 + 8_640_184.812866) * tut1
        + 67_310.54841;

    // 240 sidereal seconds per degree
    (seconds.to_radians() / 240.0).rem_euclid(TAU)
}

/// Rotate an inertial (TEME) vector into the Earth-fixed frame
pub fn eci_to_ecf(eci: [f64; 3], gmst: f64) -> [f64; 3] {
    let (s, c) = gmst.sin_cos();
    [c * eci[0] + s * eci[1], -s * eci[0] + c * eci[1], eci[2]]
}

/// Look angles of an Earth-fixed target as seen by `observer`
pub fn ecf_to_look_angles(observer: &Observer, target_ecf_km: [f64; 3]) -> Result<LookAngles> {
    let station = observer.to_ecf_km();
    let rx = target_ecf_km[0] - station[0];
    let ry = target_ecf_km[1] - station[1];
    let rz = target_ecf_km[2] - station[2];

    let lat = observer.latitude_deg.to_radians();
    let lon = observer.longitude_deg.to_radians();
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();

    // South-East-Zenith
    let south = sin_lat * cos_lon * rx + sin_lat * sin_lon * ry - cos_lat * rz;
    let east = -sin_lon * rx + cos_lon * ry;
    let zenith = cos_lat * cos_lon * rx + cos_lat * sin_lon * ry + sin_lat * rz;

    let range_km = (south * south + east * east + zenith * zenith).sqrt();
    if !range_km.is_finite() {
        return Err(VisibilityError::Transform(
            "non-finite range to satellite".to_string(),
        ));
    }
    if range_km < f64::EPSILON {
        return Err(VisibilityError::Transform(
            "satellite coincides with observer".to_string(),
        ));
    }

    let elevation = (zenith / range_km).clamp(-1.0, 1.0).asin();
    let azimuth = ((-east).atan2(south) + PI).rem_euclid(TAU);

    Ok(LookAngles {
        azimuth_deg: azimuth.to_degrees().rem_euclid(360.0),
        elevation_deg: elevation.to_degrees(),
        range_km,
    })
}

/// Look angles of an inertial position at instant `t`
pub fn eci_to_look_angles(
    observer: &Observer,
    position_eci_km: [f64; 3],
    t: DateTime<Utc>,
) -> Result<LookAngles> {
    let ecf = eci_to_ecf(position_eci_km, gmst_rad(t));
    ecf_to_look_angles(observer, ecf)
}

/// Round to one decimal, as served on the wire
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Format an azimuth with one decimal, folding 360.0 back to 0.0
pub fn format_azimuth(azimuth_deg: f64) -> String {
    let rounded = round_one_decimal(azimuth_deg);
    let folded = if rounded >= 360.0 { rounded - 360.0 } else { rounded };
    format!("{:.1}", folded)
}

/// Format an elevation with one decimal
pub fn format_elevation(elevation_deg: f64) -> String {
    let rounded = round_one_decimal(elevation_deg);
    // avoid "-0.0"
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.1}", rounded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_observer_validation() {
        assert!(Observer::new(45.0, 5.0, 200.0).is_ok());
        assert!(Observer::new(90.0, -180.0, 0.0).is_ok());
        assert!(matches!(
            Observer::new(91.0, 0.0, 0.0),
            Err(VisibilityError::InvalidRequest(_))
        ));
        assert!(matches!(
            Observer::new(0.0, 180.5, 0.0),
            Err(VisibilityError::InvalidRequest(_))
        ));
        assert!(Observer::new(f64::NAN, 0.0, 0.0).is_err());
        assert!(Observer::new(0.0, 0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_observer_ecf_equator_and_pole() {
        let equator = Observer::default().to_ecf_km();
        assert!((equator[0] - EARTH_EQUATORIAL_RADIUS_KM).abs() < 1e-9);
        assert!(equator[1].abs() < 1e-9);
        assert!(equator[2].abs() < 1e-9);

        let pole = Observer::at_sea_level(90.0, 0.0).unwrap().to_ecf_km();
        assert!(pole[0].abs() < 1e-6);
        assert!((pole[2] - EARTH_POLAR_RADIUS_KM).abs() < 1e-6);

        let raised = Observer::new(0.0, 0.0, 1000.0).unwrap().to_ecf_km();
        assert!((raised[0] - EARTH_EQUATORIAL_RADIUS_KM - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_julian_date_j2000() {
        let j2000 = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert!((julian_date(j2000) - J2000_JULIAN_DATE).abs() < 1e-9);
    }

    #[test]
    fn test_gmst_reference_value() {
        // Vallado example 3-5: 1992-08-20 12:14 UT1 -> GMST 152.578787886 deg
        let t = Utc.with_ymd_and_hms(1992, 8, 20, 12, 14, 0).unwrap();
        let gmst_deg = gmst_rad(t).to_degrees();
        assert!((gmst_deg - 152.578787886).abs() < 1e-3, "gmst = {}", gmst_deg);
    }

    #[test]
    fn test_gmst_range() {
        let t = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        let gmst = gmst_rad(t);
        assert!((0.0..TAU).contains(&gmst));
    }

    #[test]
    fn test_eci_to_ecf_rotation() {
        let eci = [1000.0, 0.0, 500.0];
        let same = eci_to_ecf(eci, 0.0);
        assert!((same[0] - 1000.0).abs() < 1e-10);
        assert!(same[1].abs() < 1e-10);

        // Earth rotated 90 deg east: an inertial +X vector appears at -Y
        let rotated = eci_to_ecf(eci, PI / 2.0);
        assert!(rotated[0].abs() < 1e-10);
        assert!((rotated[1] + 1000.0).abs() < 1e-10);
        assert!((rotated[2] - 500.0).abs() < 1e-10);
    }

    #[test]
    fn test_look_angles_zenith() {
        let observer = Observer::default();
        let overhead = [EARTH_EQUATORIAL_RADIUS_KM + 500.0, 0.0, 0.0];
        let look = ecf_to_look_angles(&observer, overhead).unwrap();
        assert!((look.elevation_deg - 90.0).abs() < 1e-9);
        assert!((look.range_km - 500.0).abs() < 1e-9);
    }

    #[test]
    fn test_look_angles_cardinal_directions() {
        let observer = Observer::default();
        let r = EARTH_EQUATORIAL_RADIUS_KM;

        // Due north along +Z, on the local horizon plane
        let north = ecf_to_look_angles(&observer, [r, 0.0, 1000.0]).unwrap();
        assert!(north.azimuth_deg < 1e-9 || (360.0 - north.azimuth_deg) < 1e-9);
        assert!(north.elevation_deg.abs() < 1e-9);

        // Due east along +Y
        let east = ecf_to_look_angles(&observer, [r, 1000.0, 0.0]).unwrap();
        assert!((east.azimuth_deg - 90.0).abs() < 1e-9);

        // Below the horizon on the far side of the Earth
        let below = ecf_to_look_angles(&observer, [-r - 500.0, 0.0, 0.0]).unwrap();
        assert!((below.elevation_deg + 90.0).abs() < 1e-9);
        assert!(!below.is_above_horizon());
    }

    #[test]
    fn test_look_angles_degenerate_geometry() {
        let observer = Observer::default();
        let station = observer.to_ecf_km();
        assert!(matches!(
            ecf_to_look_angles(&observer, station),
            Err(VisibilityError::Transform(_))
        ));
        assert!(matches!(
            ecf_to_look_angles(&observer, [f64::NAN, 0.0, 0.0]),
            Err(VisibilityError::Transform(_))
        ));
    }

    #[test]
    fn test_formatting() {
        assert_eq!(format_azimuth(359.97), "0.0");
        assert_eq!(format_azimuth(12.345), "12.3");
        assert_eq!(format_elevation(-0.04), "0.0");
        assert_eq!(format_elevation(-5.06), "-5.1");
    }
}
