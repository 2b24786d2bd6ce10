use std::fs;
use std::ops::Range;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::astro::time::{datetime_from_julian_date, MJD_OFFSET};

const MJD_COLUMNS: Range<usize> = 0..14;
const RA_COLUMNS: Range<usize> = 15..27;
const DEC_COLUMNS: Range<usize> = 27..40;
const AZIMUTH_COLUMNS: Range<usize> = 60..72;
const ELEVATION_COLUMNS: Range<usize> = 72..84;

#[derive(Debug, Error)]
pub enum EphemerisError {
    #[error("cannot read ephemeris {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("ephemeris {0} has no lines")]
    Empty(String),
    #[error("cannot encode ephemeris lines: {0}")]
    Json(#[from] serde_json::Error),
    #[error("bad {field} column: {message}")]
    Column { field: &'static str, message: String },
}

/// Lines of an ephemeris file with their `\n` terminators removed.
pub fn read_lines(path: &Path) -> Result<Vec<String>, EphemerisError> {
    let content = fs::read_to_string(path).map_err(|source| EphemerisError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let lines: Vec<String> = content.split_terminator('\n').map(str::to_string).collect();
    if lines.is_empty() {
        return Err(EphemerisError::Empty(path.display().to_string()));
    }
    Ok(lines)
}

/// JSON array payload for the `sat:ephlines` action.
pub fn serialize_lines(lines: &[String]) -> Result<String, EphemerisError> {
    Ok(serde_json::to_string(lines)?)
}

/// One fixed-width ephemeris row. Angles in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EphemerisRecord {
    pub mjd: f64,
    pub ra_deg: f64,
    pub dec_deg: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl EphemerisRecord {
    pub fn parse(line: &str) -> Result<Self, EphemerisError> {
        Ok(Self {
            mjd: column(line, MJD_COLUMNS, "MJD")?,
            ra_deg: column(line, RA_COLUMNS, "RA")?,
            dec_deg: column(line, DEC_COLUMNS, "DEC")?,
            azimuth_deg: column(line, AZIMUTH_COLUMNS, "AZI")?,
            elevation_deg: column(line, ELEVATION_COLUMNS, "ELE")?,
        })
    }

    pub fn julian_date(&self) -> f64 {
        self.mjd + MJD_OFFSET
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        datetime_from_julian_date(self.julian_date())
    }
}

fn column(line: &str, range: Range<usize>, field: &'static str) -> Result<f64, EphemerisError> {
    let text = line.get(range.clone()).ok_or_else(|| EphemerisError::Column {
        field,
        message: format!("line has {} bytes, needs {}", line.len(), range.end),
    })?;
    text.trim().parse().map_err(|e| EphemerisError::Column {
        field,
        message: format!("{:?}: {}", text.trim(), e),
    })
}

/// Decodes every row that carries the fixed columns; header and
/// comment lines are skipped.
pub fn parse_records(lines: &[String]) -> Vec<EphemerisRecord> {
    lines
        .iter()
        .filter_map(|line| match EphemerisRecord::parse(line) {
            Ok(record) => Some(record),
            Err(e) => {
                log::debug!("Skipping ephemeris line {:?}: {}", line, e);
                None
            }
        })
        .collect()
}
