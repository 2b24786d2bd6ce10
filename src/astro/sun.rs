use chrono::{DateTime, Utc};

use super::frames::{dot, norm};
use super::time::{julian_date_utc, J2000_JD};

pub const AU_KM: f64 = 149_597_870.7;
pub const EARTH_RADIUS_KM: f64 = 6_378.137;

/// Geocentric Sun position (km) in the mean equatorial frame of date.
/// Low-precision almanac series, good to about 0.01 degree.
pub fn sun_position_km(t: DateTime<Utc>) -> [f64; 3] {
    let n = julian_date_utc(t) - J2000_JD;

    let mean_longitude = (280.460 + 0.985_647_4 * n).rem_euclid(360.0);
    let mean_anomaly = (357.528 + 0.985_600_3 * n).rem_euclid(360.0).to_radians();

    let ecliptic_longitude = (mean_longitude
        + 1.915 * mean_anomaly.sin()
        + 0.020 * (2.0 * mean_anomaly).sin())
    .rem_euclid(360.0)
    .to_radians();
    let obliquity = (23.439 - 0.000_000_4 * n).to_radians();

    let distance_km = AU_KM
        * (1.000_14 - 0.016_71 * mean_anomaly.cos() - 0.000_14 * (2.0 * mean_anomaly).cos());

    [
        distance_km * ecliptic_longitude.cos(),
        distance_km * ecliptic_longitude.sin() * obliquity.cos(),
        distance_km * ecliptic_longitude.sin() * obliquity.sin(),
    ]
}

/// Cylindrical Earth-shadow test: a satellite is dark only when it is on
/// the night side and within one Earth radius of the Earth-Sun axis.
pub fn is_sunlit(sat_km: [f64; 3], sun_km: [f64; 3]) -> bool {
    let sun_distance = norm(sun_km);
    if sun_distance == 0.0 {
        return true;
    }
    let sun_hat = [
        sun_km[0] / sun_distance,
        sun_km[1] / sun_distance,
        sun_km[2] / sun_distance,
    ];

    let along = dot(sat_km, sun_hat);
    if along >= 0.0 {
        return true;
    }
    let off_axis_sq = dot(sat_km, sat_km) - along * along;
    off_axis_sq > EARTH_RADIUS_KM * EARTH_RADIUS_KM
}
