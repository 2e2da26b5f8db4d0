//! Next AOS/LOS search by forward time stepping.
//!
//! Only a single transition is reported: a satellite below the horizon at
//! `now` gets an AOS countdown, one above it gets an LOS countdown. The
//! search never re-arms after the first event.

use chrono::{DateTime, Duration, Utc};
use satvis_common::NO_EVENT;

use super::calculator::LookAngleSource;
use crate::error::Result;

/// 90 minutes, longer than any low Earth orbit period
pub const DEFAULT_HORIZON_SECONDS: i64 = 5400;

/// How the horizon is sampled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStrategy {
    /// Propagate every second
    #[default]
    Exact,
    /// Sample every `step_seconds`, then bisect to the crossing second.
    /// Passes shorter than the step can be missed.
    Coarse { step_seconds: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchConfig {
    /// Capped at `DEFAULT_HORIZON_SECONDS`
    pub horizon_seconds: i64,
    pub strategy: SearchStrategy,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            horizon_seconds: DEFAULT_HORIZON_SECONDS,
            strategy: SearchStrategy::Exact,
        }
    }
}

/// Seconds until the next AOS and LOS, `-1` when not found
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NextEvents {
    pub next_aos_countdown: i64,
    pub next_los_countdown: i64,
}

impl NextEvents {
    pub fn none() -> Self {
        Self {
            next_aos_countdown: NO_EVENT,
            next_los_countdown: NO_EVENT,
        }
    }
}

impl Default for NextEvents {
    fn default() -> Self {
        Self::none()
    }
}

/// Find the next horizon crossing of `source` after `now`.
///
/// If `now` itself is a propagation gap there is no reference state and
/// both countdowns stay `-1`.
pub fn find_next_events<S: LookAngleSource + ?Sized>(
    source: &S,
    now: DateTime<Utc>,
    config: &SearchConfig,
) -> Result<NextEvents> {
    let Some(start) = source.look_angles_at(now)? else {
        return Ok(NextEvents::none());
    };
    let started_above = start.is_above_horizon();
    let horizon_seconds = config.horizon_seconds.clamp(0, DEFAULT_HORIZON_SECONDS);

    // Below: wait for el > 0. Above: wait for el <= 0.
    let crossed = |elevation: f64| {
        if started_above {
            elevation <= 0.0
        } else {
            elevation > 0.0
        }
    };

    let found = match config.strategy {
        SearchStrategy::Exact => scan_exact(source, now, horizon_seconds, &crossed)?,
        SearchStrategy::Coarse { step_seconds } => scan_coarse(
            source,
            now,
            horizon_seconds,
            i64::from(step_seconds.max(1)),
            &crossed,
        )?,
    };

    let mut events = NextEvents::none();
    if let Some(t) = found {
        if started_above {
            events.next_los_countdown = t;
        } else {
            events.next_aos_countdown = t;
        }
    }

    tracing::debug!(
        "Event search from {} (above={}): aos={}, los={}",
        now,
        started_above,
        events.next_aos_countdown,
        events.next_los_countdown
    );
    Ok(events)
}

fn elevation_at<S: LookAngleSource + ?Sized>(
    source: &S,
    now: DateTime<Utc>,
    t: i64,
) -> Result<Option<f64>> {
    Ok(source
        .look_angles_at(now + Duration::seconds(t))?
        .map(|look| look.elevation_deg))
}

fn scan_exact<S, F>(
    source: &S,
    now: DateTime<Utc>,
    horizon_seconds: i64,
    crossed: &F,
) -> Result<Option<i64>>
where
    S: LookAngleSource + ?Sized,
    F: Fn(f64) -> bool,
{
    for t in 0..horizon_seconds {
        // gaps are skipped, not fatal
        let Some(elevation) = elevation_at(source, now, t)? else {
            continue;
        };
        if crossed(elevation) {
            return Ok(Some(t));
        }
    }
    Ok(None)
}

fn scan_coarse<S, F>(
    source: &S,
    now: DateTime<Utc>,
    horizon_seconds: i64,
    step_seconds: i64,
    crossed: &F,
) -> Result<Option<i64>>
where
    S: LookAngleSource + ?Sized,
    F: Fn(f64) -> bool,
{
    if horizon_seconds <= 0 {
        return Ok(None);
    }
    let last = horizon_seconds - 1;

    // t = 0 is the reference state and can never be a crossing
    let mut not_crossed = 0;
    let mut t = step_seconds.min(last);
    while t > not_crossed {
        if let Some(elevation) = elevation_at(source, now, t)? {
            if crossed(elevation) {
                return refine(source, now, not_crossed, t, crossed).map(Some);
            }
            not_crossed = t;
        }
        if t == last {
            break;
        }
        t = (t + step_seconds).min(last);
    }
    Ok(None)
}

/// Smallest second in `(lo, hi]` that is crossed, given `lo` is not and `hi` is
fn refine<S, F>(
    source: &S,
    now: DateTime<Utc>,
    mut lo: i64,
    mut hi: i64,
    crossed: &F,
) -> Result<i64>
where
    S: LookAngleSource + ?Sized,
    F: Fn(f64) -> bool,
{
    while hi - lo > 1 {
        let mid = lo + (hi - lo) / 2;
        match elevation_at(source, now, mid)? {
            Some(elevation) if crossed(elevation) => hi = mid,
            Some(_) => lo = mid,
            None => {
                // gap in the middle: fall back to a linear walk
                for s in (lo + 1)..hi {
                    if let Some(elevation) = elevation_at(source, now, s)? {
                        if crossed(elevation) {
                            return Ok(s);
                        }
                    }
                }
                return Ok(hi);
            }
        }
    }
    Ok(hi)
}
