use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::fmt;

use crate::predict::error::PredictError;

/// A span of time searched for passes: `[start, start + duration]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObservationWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    duration: Duration,
}

impl ObservationWindow {
    pub fn new(start: DateTime<Utc>, duration: Duration) -> Result<Self, PredictError> {
        if duration < Duration::zero() {
            return Err(PredictError::InvalidWindow(format!(
                "negative duration of {} s",
                duration.num_seconds()
            )));
        }
        let end = start.checked_add_signed(duration).ok_or_else(|| {
            PredictError::InvalidWindow(format!(
                "duration of {} s overflows the calendar",
                duration.num_seconds()
            ))
        })?;
        Ok(Self {
            start,
            end,
            duration,
        })
    }

    pub fn from_minutes(start: DateTime<Utc>, minutes: i64) -> Result<Self, PredictError> {
        let duration = Duration::try_minutes(minutes).ok_or_else(|| {
            PredictError::InvalidWindow(format!("duration of {minutes} min out of range"))
        })?;
        Self::new(start, duration)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> f64 {
        minutes(self.duration)
    }

    /// Minutes from the window start to `t`, from true instant arithmetic.
    pub fn offset_minutes(&self, t: DateTime<Utc>) -> f64 {
        minutes(t - self.start)
    }
}

pub(crate) fn minutes(d: Duration) -> f64 {
    d.num_microseconds()
        .map(|us| us as f64 / 60e6)
        .unwrap_or_else(|| d.num_seconds() as f64 / 60.0)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    Rise,
    Culminate,
    Set,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VisibilityEvent {
    pub kind: EventKind,
    pub time: DateTime<Utc>,
    pub elevation_deg: f64,
}

/// A predicted pass above the minimum elevation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pass {
    pub satellite: String,
    pub catalog_number: String,
    pub rise: DateTime<Utc>,
    pub set: DateTime<Utc>,
    pub rise_offset_min: f64,
    pub duration_min: f64,
    pub peak_elevation_deg: Option<f64>,
    pub sunlit_fraction: f64,
    pub altitude_km: f64,
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let peak = match self.peak_elevation_deg {
            Some(el) => format!("{:.2} °", el),
            None => "----".to_string(),
        };
        write!(
            f,
            "{:<24} {:<8} {:>8.2} min {:>7.2} min {:>7.2} % {:>9.2} km {:>9}",
            self.satellite,
            self.catalog_number,
            self.rise_offset_min,
            self.duration_min,
            self.sunlit_fraction,
            self.altitude_km,
            peak
        )
    }
}
