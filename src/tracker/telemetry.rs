use serde::{Deserialize, Serialize};

use crate::astro::topocentric_to_horizontal;
use crate::predict::GroundStation;

/// Mount status bit set while the mount is still moving to its target.
pub const MOUNT_STATUS_SLEWING: u32 = 1 << 2;
/// Satellite status bit set while a track is being followed.
pub const SAT_STATUS_TRACKING: u32 = 1 << 0;
/// Satellite status bit set while the target is in sunlight.
pub const SAT_STATUS_SUNLIT: u32 = 1 << 1;

/// Reply to `GetTelStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MountTelemetry {
    #[serde(alias = "JD")]
    pub jd: f64,
    #[serde(alias = "RA")]
    pub ra: f64,
    #[serde(alias = "DEC")]
    pub dec: f64,
    #[serde(alias = "Status")]
    pub status: u32,
}

/// Reply to `getSatStatus`. Axis errors are in milliradians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SatelliteTelemetry {
    #[serde(alias = "Status")]
    pub status: u32,
    #[serde(default)]
    pub err_axis1: Option<f64>,
    #[serde(default)]
    pub err_axis2: Option<f64>,
}

/// Where the mount points, in horizontal coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MountPosition {
    pub julian_date: f64,
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub slewing: bool,
}

impl MountPosition {
    pub fn from_telemetry(telemetry: &MountTelemetry, station: &GroundStation) -> Self {
        let (azimuth_deg, elevation_deg) =
            topocentric_to_horizontal(telemetry.ra, telemetry.dec, telemetry.jd, station);
        Self {
            julian_date: telemetry.jd,
            azimuth_deg,
            elevation_deg,
            slewing: telemetry.status & MOUNT_STATUS_SLEWING != 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrackingQuality {
    pub tracking: bool,
    pub sunlit: bool,
    pub error_axis1_mrad: Option<f64>,
    pub error_axis2_mrad: Option<f64>,
}

impl From<&SatelliteTelemetry> for TrackingQuality {
    fn from(telemetry: &SatelliteTelemetry) -> Self {
        Self {
            tracking: telemetry.status & SAT_STATUS_TRACKING != 0,
            sunlit: telemetry.status & SAT_STATUS_SUNLIT != 0,
            error_axis1_mrad: telemetry.err_axis1,
            error_axis2_mrad: telemetry.err_axis2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::local_apparent_sidereal_time_deg;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_mount_telemetry_field_aliases() {
        let lower: MountTelemetry =
            serde_json::from_str(r#"{"jd": 2460000.5, "ra": 10.0, "dec": -5.0, "status": 4}"#).unwrap();
        let upper: MountTelemetry =
            serde_json::from_str(r#"{"JD": 2460000.5, "RA": 10.0, "DEC": -5.0, "Status": 4}"#).unwrap();
        assert_eq!(lower, upper);
    }

    #[test]
    fn test_mount_telemetry_missing_field_rejected() {
        assert!(serde_json::from_str::<MountTelemetry>(r#"{"jd": 2460000.5, "ra": 10.0}"#).is_err());
    }

    #[test]
    fn test_mount_position_at_zenith_and_slewing() {
        let station = GroundStation {
            latitude_deg: 28.5,
            longitude_deg: -80.6,
            altitude_m: 3.0,
        };
        let jd = 2_460_000.5;
        let telemetry = MountTelemetry {
            jd,
            ra: local_apparent_sidereal_time_deg(jd, station.longitude_deg),
            dec: station.latitude_deg,
            status: MOUNT_STATUS_SLEWING | 1,
        };
        let position = MountPosition::from_telemetry(&telemetry, &station);
        assert_abs_diff_eq!(position.elevation_deg, 90.0, epsilon = 1e-6);
        assert!(position.slewing);

        let settled = MountPosition::from_telemetry(
            &MountTelemetry {
                status: 0b011,
                ..telemetry
            },
            &station,
        );
        assert!(!settled.slewing);
    }

    #[test]
    fn test_satellite_status_bits_and_optional_errors() {
        let telemetry: SatelliteTelemetry =
            serde_json::from_str(r#"{"status": 3, "err_axis1": 0.12}"#).unwrap();
        let quality = TrackingQuality::from(&telemetry);
        assert!(quality.tracking);
        assert!(quality.sunlit);
        assert_eq!(quality.error_axis1_mrad, Some(0.12));
        assert_eq!(quality.error_axis2_mrad, None);

        let idle = TrackingQuality::from(&SatelliteTelemetry {
            status: 0,
            err_axis1: None,
            err_axis2: None,
        });
        assert!(!idle.tracking && !idle.sunlit);
    }
}
