use chrono::{DateTime, Duration, Utc};

pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
pub const J2000_JD: f64 = 2_451_545.0;
pub const MJD_OFFSET: f64 = 2_400_000.5;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// TT - UTC: 37 leap seconds plus the fixed 32.184 s TAI to TT offset.
/// UT1 is taken equal to UTC.
pub const TT_MINUS_UTC_S: f64 = 69.184;

pub fn julian_date_utc(t: DateTime<Utc>) -> f64 {
    let unix = t.timestamp() as f64 + t.timestamp_subsec_nanos() as f64 * 1e-9;
    UNIX_EPOCH_JD + unix / SECONDS_PER_DAY
}

pub fn julian_date_tt(t: DateTime<Utc>) -> f64 {
    julian_date_utc(t) + TT_MINUS_UTC_S / SECONDS_PER_DAY
}

pub fn tt_to_ut1(jd_tt: f64) -> f64 {
    jd_tt - TT_MINUS_UTC_S / SECONDS_PER_DAY
}

pub fn modified_julian_date(jd: f64) -> f64 {
    jd - MJD_OFFSET
}

/// Inverse of [`julian_date_utc`], rounded to the microsecond.
pub fn datetime_from_julian_date(jd_utc: f64) -> Option<DateTime<Utc>> {
    let micros = ((jd_utc - UNIX_EPOCH_JD) * SECONDS_PER_DAY * 1e6).round();
    if !micros.is_finite() {
        return None;
    }
    DateTime::<Utc>::UNIX_EPOCH.checked_add_signed(Duration::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use chrono::TimeZone;

    #[test]
    fn test_j2000_epoch() {
        let t = Utc.with_ymd_and_hms(2000, 1, 1, 12, 0, 0).unwrap();
        assert_abs_diff_eq!(julian_date_utc(t), J2000_JD, epsilon = 1e-9);
        assert_abs_diff_eq!(modified_julian_date(J2000_JD), 51_544.5, epsilon = 1e-9);
    }

    #[test]
    fn test_tt_offset_round_trip() {
        let t = Utc.with_ymd_and_hms(2025, 11, 25, 13, 10, 0).unwrap();
        let jd_tt = julian_date_tt(t);
        assert_abs_diff_eq!(
            (jd_tt - julian_date_utc(t)) * SECONDS_PER_DAY,
            TT_MINUS_UTC_S,
            epsilon = 1e-3
        );
        assert_abs_diff_eq!(tt_to_ut1(jd_tt), julian_date_utc(t), epsilon = 1e-9);
    }

    #[test]
    fn test_datetime_from_julian_date() {
        let t = Utc.with_ymd_and_hms(2024, 3, 20, 3, 6, 30).unwrap();
        let back = datetime_from_julian_date(julian_date_utc(t)).unwrap();
        assert!((back - t).num_milliseconds().abs() <= 1);
        assert!(datetime_from_julian_date(f64::NAN).is_none());
    }
}
