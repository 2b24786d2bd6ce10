use super::time::{tt_to_ut1, J2000_JD};
use crate::predict::GroundStation;

const DAYS_PER_JULIAN_CENTURY: f64 = 36_525.0;

/// Mean sidereal time at Greenwich in degrees, for a Julian date in UT1.
pub fn greenwich_mean_sidereal_time_deg(jd_ut1: f64) -> f64 {
    let d = jd_ut1 - J2000_JD;
    let t = d / DAYS_PER_JULIAN_CENTURY;
    (280.460_618_37 + 360.985_647_366_29 * d + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0)
        .rem_euclid(360.0)
}

/// Nutation in longitude projected on the equator (degrees), low-precision
/// series good to about half an arcsecond.
pub fn equation_of_equinoxes_deg(jd_tt: f64) -> f64 {
    let t = (jd_tt - J2000_JD) / DAYS_PER_JULIAN_CENTURY;
    let node = (125.044_52 - 1_934.136_261 * t).to_radians();
    let sun_longitude = (280.4665 + 36_000.7698 * t).to_radians();
    let moon_longitude = (218.3165 + 481_267.8813 * t).to_radians();

    let nutation_arcsec = -17.20 * node.sin() - 1.32 * (2.0 * sun_longitude).sin()
        - 0.23 * (2.0 * moon_longitude).sin()
        + 0.21 * (2.0 * node).sin();
    let obliquity = (23.439_291_1 - 0.013_004_2 * t).to_radians();

    nutation_arcsec / 3600.0 * obliquity.cos()
}

/// Local apparent sidereal time in degrees. `jd_tt` is read as Terrestrial
/// Time.
pub fn local_apparent_sidereal_time_deg(jd_tt: f64, longitude_deg: f64) -> f64 {
    let gast =
        greenwich_mean_sidereal_time_deg(tt_to_ut1(jd_tt)) + equation_of_equinoxes_deg(jd_tt);
    (gast + longitude_deg).rem_euclid(360.0)
}

/// Converts topocentric right ascension / declination to azimuth and
/// elevation at `station`, returned as `(azimuth_deg, elevation_deg)`.
///
/// Azimuth is measured from North through East. `julian_date` is treated as
/// Terrestrial Time. When the target sits on the zenith the azimuth is
/// undefined and reported as 0.
pub fn topocentric_to_horizontal(
    ra_deg: f64,
    dec_deg: f64,
    julian_date: f64,
    station: &GroundStation,
) -> (f64, f64) {
    let ra = ra_deg.to_radians();
    let dec = dec_deg.to_radians();
    let lat = station.lat_rad();

    let lst = local_apparent_sidereal_time_deg(julian_date, station.longitude_deg).to_radians();
    let hour_angle = lst - ra;

    let sin_el = (dec.sin() * lat.sin() + dec.cos() * lat.cos() * hour_angle.cos()).clamp(-1.0, 1.0);
    let elevation = sin_el.asin();

    let denominator = elevation.cos() * lat.cos();
    let mut azimuth = if denominator.abs() < 1e-12 {
        0.0
    } else {
        ((dec.sin() - sin_el * lat.sin()) / denominator)
            .clamp(-1.0, 1.0)
            .acos()
            .to_degrees()
    };
    if hour_angle.sin() > 0.0 {
        azimuth = 360.0 - azimuth;
    }

    (azimuth.rem_euclid(360.0), elevation.to_degrees())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::astro::time::TT_MINUS_UTC_S;
    use approx::assert_abs_diff_eq;

    fn canaveral() -> GroundStation {
        GroundStation {
            latitude_deg: 28.5,
            longitude_deg: -80.6,
            altitude_m: 3.0,
        }
    }

    #[test]
    fn test_gmst_known_answers() {
        // 1987-04-10 00:00 UT
        assert_abs_diff_eq!(
            greenwich_mean_sidereal_time_deg(2_446_895.5),
            197.693_195,
            epsilon = 1e-5
        );
        // 1987-04-10 19:21 UT
        assert_abs_diff_eq!(
            greenwich_mean_sidereal_time_deg(2_446_896.306_25),
            128.737_873,
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_equation_of_equinoxes_known_answer() {
        // 1987-04-10: nutation in longitude -3.788"
        assert_abs_diff_eq!(
            equation_of_equinoxes_deg(2_446_895.5),
            -0.000_965,
            epsilon = 2e-4
        );
    }

    #[test]
    fn test_lst_applies_longitude_and_tt_offset() {
        let jd_ut1 = 2_446_895.5;
        let jd_tt = jd_ut1 + TT_MINUS_UTC_S / 86_400.0;
        let greenwich = local_apparent_sidereal_time_deg(jd_tt, 0.0);
        let west = local_apparent_sidereal_time_deg(jd_tt, -80.6);
        assert_abs_diff_eq!(
            greenwich,
            greenwich_mean_sidereal_time_deg(jd_ut1) + equation_of_equinoxes_deg(jd_tt),
            epsilon = 1e-9
        );
        assert_abs_diff_eq!((greenwich - west).rem_euclid(360.0), 80.6, epsilon = 1e-9);
    }

    #[test]
    fn test_overhead_target_is_at_zenith() {
        let station = canaveral();
        let jd = 2_460_000.5;
        let lst = local_apparent_sidereal_time_deg(jd, station.longitude_deg);

        let (az, el) = topocentric_to_horizontal(lst, station.latitude_deg, jd, &station);
        assert_abs_diff_eq!(el, 90.0, epsilon = 1e-6);
        assert!(az.is_finite());
    }

    #[test]
    fn test_meridian_transit_south_of_zenith() {
        let station = canaveral();
        let jd = 2_460_000.5;
        let lst = local_apparent_sidereal_time_deg(jd, station.longitude_deg);

        let (az, el) = topocentric_to_horizontal(lst, station.latitude_deg - 30.0, jd, &station);
        assert_abs_diff_eq!(el, 60.0, epsilon = 1e-6);
        assert_abs_diff_eq!(az, 180.0, epsilon = 1e-4);
    }

    #[test]
    fn test_azimuth_quadrant_east_and_west() {
        let equator = GroundStation {
            latitude_deg: 0.0,
            longitude_deg: 0.0,
            altitude_m: 0.0,
        };
        let jd = 2_460_000.5;
        let lst = local_apparent_sidereal_time_deg(jd, 0.0);

        // Hour angle +6h: setting in the west.
        let (az, el) = topocentric_to_horizontal(lst - 90.0, 0.0, jd, &equator);
        assert_abs_diff_eq!(el, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(az, 270.0, epsilon = 1e-4);

        // Hour angle -6h: rising in the east.
        let (az, el) = topocentric_to_horizontal(lst + 90.0, 0.0, jd, &equator);
        assert_abs_diff_eq!(el, 0.0, epsilon = 1e-6);
        assert_abs_diff_eq!(az, 90.0, epsilon = 1e-4);
    }

    #[test]
    fn test_circumpolar_north_star_low_elevation_north() {
        let station = canaveral();
        let jd = 2_460_000.5;
        let lst = local_apparent_sidereal_time_deg(jd, station.longitude_deg);

        // Lower culmination of a dec +80 star: HA = 12h.
        let (az, el) = topocentric_to_horizontal(lst + 180.0, 80.0, jd, &station);
        assert_abs_diff_eq!(el, 28.5 - 10.0, epsilon = 1e-6);
        assert!(az < 1e-3 || az > 360.0 - 1e-3);
    }
}
