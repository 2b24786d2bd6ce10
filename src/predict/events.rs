use chrono::{DateTime, Duration, Utc};

use crate::predict::error::PredictError;
use crate::predict::geometry::PassGeometry;
use crate::predict::types::{EventKind, ObservationWindow, VisibilityEvent};

/// Crossings and culminations are refined until the bracket is this narrow.
const REFINE_TOLERANCE_MS: i64 = 100;

const INV_PHI: f64 = 0.618_033_988_749_895;

/// Scans `window` for crossings of `threshold_deg` and culminations above
/// it, returned in time order.
pub fn find_events<G: PassGeometry + ?Sized>(
    geometry: &G,
    window: &ObservationWindow,
    threshold_deg: f64,
    step: Duration,
) -> Result<Vec<VisibilityEvent>, PredictError> {
    if step <= Duration::zero() {
        return Err(PredictError::InvalidWindow(
            "search step must be positive".to_string(),
        ));
    }

    let mut samples = Vec::new();
    let mut cursor = window.start();
    while cursor < window.end() {
        samples.push((cursor, geometry.elevation_deg(cursor)?));
        cursor += step;
    }
    samples.push((window.end(), geometry.elevation_deg(window.end())?));

    let mut events = Vec::new();

    for pair in samples.windows(2) {
        let (t_a, el_a) = pair[0];
        let (t_b, el_b) = pair[1];

        if el_a <= threshold_deg && el_b > threshold_deg {
            events.push(refine_crossing(geometry, t_a, t_b, threshold_deg, EventKind::Rise)?);
        } else if el_a > threshold_deg && el_b <= threshold_deg {
            events.push(refine_crossing(geometry, t_a, t_b, threshold_deg, EventKind::Set)?);
        }
    }

    for triple in samples.windows(3) {
        let (t_prev, el_prev) = triple[0];
        let (_, el) = triple[1];
        let (t_next, el_next) = triple[2];

        if el > el_prev && el >= el_next {
            let peak = refine_culmination(geometry, t_prev, t_next)?;
            if peak.elevation_deg > threshold_deg {
                events.push(peak);
            }
        }
    }

    events.sort_by_key(|event| event.time);
    Ok(events)
}

/// Bisection on a bracket whose ends lie on opposite sides of the threshold.
fn refine_crossing<G: PassGeometry + ?Sized>(
    geometry: &G,
    before: DateTime<Utc>,
    after: DateTime<Utc>,
    threshold_deg: f64,
    kind: EventKind,
) -> Result<VisibilityEvent, PredictError> {
    let rising = kind == EventKind::Rise;
    let mut low = before;
    let mut high = after;

    while (high - low).num_milliseconds() > REFINE_TOLERANCE_MS {
        let mid = low + (high - low) / 2;
        let above = geometry.elevation_deg(mid)? > threshold_deg;

        if above == rising {
            high = mid;
        } else {
            low = mid;
        }
    }

    let time = low + (high - low) / 2;
    Ok(VisibilityEvent {
        kind,
        time,
        elevation_deg: geometry.elevation_deg(time)?,
    })
}

/// Golden-section search for the elevation maximum inside `[low, high]`.
fn refine_culmination<G: PassGeometry + ?Sized>(
    geometry: &G,
    low: DateTime<Utc>,
    high: DateTime<Utc>,
) -> Result<VisibilityEvent, PredictError> {
    let origin = low;
    let mut a = 0.0;
    let mut b = seconds_between(low, high);
    let tolerance = REFINE_TOLERANCE_MS as f64 / 1000.0;

    let mut c = b - INV_PHI * (b - a);
    let mut d = a + INV_PHI * (b - a);
    let mut el_c = geometry.elevation_deg(at(origin, c))?;
    let mut el_d = geometry.elevation_deg(at(origin, d))?;

    while b - a > tolerance {
        if el_c > el_d {
            b = d;
            d = c;
            el_d = el_c;
            c = b - INV_PHI * (b - a);
            el_c = geometry.elevation_deg(at(origin, c))?;
        } else {
            a = c;
            c = d;
            el_c = el_d;
            d = a + INV_PHI * (b - a);
            el_d = geometry.elevation_deg(at(origin, d))?;
        }
    }

    let time = at(origin, (a + b) / 2.0);
    Ok(VisibilityEvent {
        kind: EventKind::Culminate,
        time,
        elevation_deg: geometry.elevation_deg(time)?,
    })
}

fn seconds_between(a: DateTime<Utc>, b: DateTime<Utc>) -> f64 {
    let d = b - a;
    d.num_microseconds()
        .map(|us| us as f64 / 1e6)
        .unwrap_or_else(|| d.num_seconds() as f64)
}

fn at(origin: DateTime<Utc>, seconds: f64) -> DateTime<Utc> {
    origin + Duration::microseconds((seconds * 1e6).round() as i64)
}
