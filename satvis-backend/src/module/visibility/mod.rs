///! Satellite visibility
///!
///! Look angles of a satellite for a ground observer and the countdown to
///! its next rise (AOS) or set (LOS).
///!
///! ## Main Components
///! - `Sgp4Propagator`: TLE -> inertial state at any instant
///! - `Tracker`: propagator bound to an observer, yields look angles
///! - `find_next_events`: forward scan for the next horizon crossing
///! - `predict_passes`: pass list over a longer window

mod geo;
pub use geo::{
    LookAngles, Observer, ecf_to_look_angles, eci_to_ecf, eci_to_look_angles, gmst_rad,
    julian_date,
};

mod propagator;
pub use propagator::{
    Propagator, Sgp4Propagator, StateVector, TwoLineElements, minutes_since_epoch,
};

mod calculator;
pub use calculator::{
    LookAngleSource, Tracker, Visibility, VisibilityCalculator, VisibilityReport,
    compute_current_look_angles, compute_next_events, current_visibility,
};

mod events;
pub use events::{DEFAULT_HORIZON_SECONDS, NextEvents, SearchConfig, SearchStrategy, find_next_events};

mod passes;
pub use passes::{Pass, PassWindow, predict_passes};

mod query;
pub use query::{PassQuery, VisibilityRequest, query_passes, query_visibility};
