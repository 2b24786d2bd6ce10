//! Time scales, reference frames and the horizontal-coordinate transform
//! shared by pass prediction and live telescope telemetry.

pub mod frames;
pub mod horizontal;
pub mod sun;
pub mod time;

pub use horizontal::{local_apparent_sidereal_time_deg, topocentric_to_horizontal};
pub use time::{julian_date_tt, julian_date_utc, modified_julian_date};
