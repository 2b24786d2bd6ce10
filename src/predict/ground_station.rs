use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::config::ConfigError;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

#[derive(Debug, Deserialize)]
struct StationDocument {
    location: StationLocation,
}

#[derive(Debug, Deserialize)]
struct StationLocation {
    latitude: f64,
    longitude: f64,
    altitude: f64,
}

impl GroundStation {
    /// Reads a station document of the form
    /// `{"location": {"latitude": .., "longitude": .., "altitude": ..}}`.
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let document: StationDocument = serde_json::from_str(json)?;
        Ok(Self {
            latitude_deg: document.location.latitude,
            longitude_deg: document.location.longitude,
            altitude_m: document.location.altitude,
        })
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude_deg.to_radians()
    }

    pub fn lon_rad(&self) -> f64 {
        self.longitude_deg.to_radians()
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        // WGS-84 constants
        let a = 6378.137;
        let e2 = 0.00669437999014;
        let lat = self.lat_rad();
        let lon = self.lon_rad();
        let sin_lat = lat.sin();
        let cos_lat = lat.cos();
        let n = a / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        let alt_km = self.altitude_m / 1000.0;
        [
            (n + alt_km) * cos_lat * lon.cos(),
            (n + alt_km) * cos_lat * lon.sin(),
            (n * (1.0 - e2) + alt_km) * sin_lat,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_station_from_json() {
        let station = GroundStation::from_json_str(
            r#"{"name": "OGS", "location": {"latitude": 28.5, "longitude": -80.6, "altitude": 3}}"#,
        )
        .unwrap();
        assert_eq!(
            station,
            GroundStation {
                latitude_deg: 28.5,
                longitude_deg: -80.6,
                altitude_m: 3.0,
            }
        );
    }

    #[test]
    fn test_station_missing_field_is_error() {
        let result = GroundStation::from_json_str(r#"{"location": {"latitude": 28.5}}"#);
        assert!(matches!(result, Err(ConfigError::Json(_))));
    }

    #[test]
    fn test_station_missing_file_is_error() {
        let result = GroundStation::from_json_file(Path::new("/nonexistent/station.json"));
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_position_ecef_on_equator_and_pole() {
        let equator = GroundStation {
            latitude_deg: 0.0,
            longitude_deg: 90.0,
            altitude_m: 1000.0,
        };
        let p = equator.position_ecef_km();
        assert_abs_diff_eq!(p[0], 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p[1], 6379.137, epsilon = 1e-9);
        assert_abs_diff_eq!(p[2], 0.0, epsilon = 1e-9);

        let pole = GroundStation {
            latitude_deg: 90.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        };
        assert_abs_diff_eq!(pole.position_ecef_km()[2], 6356.752, epsilon = 1e-3);
    }
}
