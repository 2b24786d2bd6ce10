use chrono::{DateTime, Utc};
use sgp4::{Constants, Elements};

use crate::astro::frames::{rotate_z, sub, teme_to_ecef_position, to_spherical};
use crate::astro::sun::{is_sunlit, sun_position_km};
use crate::astro::{julian_date_tt, local_apparent_sidereal_time_deg, topocentric_to_horizontal};
use crate::predict::error::PredictError;
use crate::predict::GroundStation;

/// What the predictor needs to know about one satellite seen from one
/// station.
pub trait PassGeometry {
    fn elevation_deg(&self, t: DateTime<Utc>) -> Result<f64, PredictError>;
    fn is_sunlit(&self, t: DateTime<Utc>) -> Result<bool, PredictError>;
    fn altitude_km(&self) -> f64;
}

pub struct Sgp4Geometry {
    station: GroundStation,
    elements: Elements,
    constants: Constants,
}

impl Sgp4Geometry {
    pub fn new(station: GroundStation, elements: Elements) -> Result<Self, PredictError> {
        let constants = Constants::from_elements(&elements).map_err(|e| {
            PredictError::InvalidTle {
                satellite: elements
                    .object_name
                    .clone()
                    .unwrap_or_else(|| elements.norad_id.to_string()),
                message: e.to_string(),
            }
        })?;
        Ok(Self {
            station,
            elements,
            constants,
        })
    }

    pub fn position_teme_km(&self, t: DateTime<Utc>) -> Result<[f64; 3], PredictError> {
        let minutes = self
            .elements
            .datetime_to_minutes_since_epoch(&t.naive_utc())
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        let prediction = self
            .constants
            .propagate(minutes)
            .map_err(|e| PredictError::Propagation(e.to_string()))?;

        Ok(prediction.position)
    }

    /// Topocentric right ascension, declination (degrees) and range (km) in
    /// the apparent equatorial frame of date.
    pub fn topocentric_equatorial(&self, t: DateTime<Utc>) -> Result<(f64, f64, f64), PredictError> {
        let teme = self.position_teme_km(t)?;
        let gmst =
            sgp4::iau_epoch_to_sidereal_time(sgp4::julian_years_since_j2000(&t.naive_utc()));

        let sat_ecef = teme_to_ecef_position(teme, gmst);
        let dr = sub(sat_ecef, self.station.position_ecef_km());

        let gast = local_apparent_sidereal_time_deg(julian_date_tt(t), 0.0).to_radians();
        Ok(to_spherical(rotate_z(dr, gast)))
    }

    /// `(azimuth_deg, elevation_deg)` of the satellite at `t`.
    pub fn horizontal(&self, t: DateTime<Utc>) -> Result<(f64, f64), PredictError> {
        let (ra, dec, _) = self.topocentric_equatorial(t)?;
        Ok(topocentric_to_horizontal(
            ra,
            dec,
            julian_date_tt(t),
            &self.station,
        ))
    }
}

impl PassGeometry for Sgp4Geometry {
    fn elevation_deg(&self, t: DateTime<Utc>) -> Result<f64, PredictError> {
        self.horizontal(t).map(|(_, el)| el)
    }

    fn is_sunlit(&self, t: DateTime<Utc>) -> Result<bool, PredictError> {
        let sat = self.position_teme_km(t)?;
        Ok(is_sunlit(sat, sun_position_km(t)))
    }

    fn altitude_km(&self) -> f64 {
        (semi_major_axis_earth_radii(&self.elements) - 1.0) * sgp4::WGS72.ae
    }
}

/// Semi-major axis in Earth radii as recovered by SGP4 initialisation
/// (Brouwer mean motion, WGS-72 constants).
pub fn semi_major_axis_earth_radii(elements: &Elements) -> f64 {
    let geopotential = sgp4::WGS72;
    let kozai_mean_motion = elements.mean_motion * std::f64::consts::TAU / 1440.0;

    let cos_i = elements.inclination.to_radians().cos();
    let e2 = elements.eccentricity * elements.eccentricity;
    let beta_sq = 1.0 - e2;

    let ak = (geopotential.ke / kozai_mean_motion).powf(2.0 / 3.0);
    let d1 = 0.75 * geopotential.j2 * (3.0 * cos_i * cos_i - 1.0) / (beta_sq.sqrt() * beta_sq);
    let del = d1 / (ak * ak);
    let adel = ak * (1.0 - del * del - del * (1.0 / 3.0 + 134.0 * del * del / 81.0));
    let del = d1 / (adel * adel);
    let brouwer_mean_motion = kozai_mean_motion / (1.0 + del);

    (geopotential.ke / brouwer_mean_motion).powf(2.0 / 3.0)
}
