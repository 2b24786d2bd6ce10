use chrono::Duration;
use log::{info, warn};
use rayon::prelude::*;

use crate::catalog::{TleCatalog, TleRecord};
use crate::predict::error::PredictError;
use crate::predict::events::find_events;
use crate::predict::geometry::{PassGeometry, Sgp4Geometry};
use crate::predict::types::{minutes, EventKind, ObservationWindow, Pass};
use crate::predict::GroundStation;

/// Passes shorter than this are not worth slewing for.
pub const MIN_PASS_DURATION_MIN: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PredictorConfig {
    pub min_elevation_deg: f64,
    pub search_step: Duration,
    pub sunlit_step: Duration,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_elevation_deg: 26.0,
            search_step: Duration::seconds(30),
            sunlit_step: Duration::seconds(5),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PassPredictor {
    config: PredictorConfig,
}

impl PassPredictor {
    pub fn new(config: PredictorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PredictorConfig {
        &self.config
    }

    /// First qualifying pass of every catalog satellite inside `window`,
    /// ordered by rise offset. Satellites that fail to propagate are logged
    /// and left out.
    pub fn predict(
        &self,
        catalog: &TleCatalog,
        station: &GroundStation,
        window: &ObservationWindow,
    ) -> Vec<Pass> {
        let records: Vec<&TleRecord> = catalog.records().collect();

        let mut passes: Vec<Pass> = records
            .par_iter()
            .filter_map(|record| match self.predict_record(record, station, window) {
                Ok(pass) => pass,
                Err(e) => {
                    warn!("Skipping {}: {}", record.name(), e);
                    None
                }
            })
            .collect();

        sort_passes(&mut passes);
        info!(
            "Predicted {} passes for {} satellites in {:.0} min window",
            passes.len(),
            records.len(),
            window.duration_minutes()
        );
        passes
    }

    fn predict_record(
        &self,
        record: &TleRecord,
        station: &GroundStation,
        window: &ObservationWindow,
    ) -> Result<Option<Pass>, PredictError> {
        let elements = record
            .elements()
            .map_err(|e| PredictError::InvalidTle {
                satellite: record.name().to_string(),
                message: e.to_string(),
            })?;
        let geometry = Sgp4Geometry::new(*station, elements)?;
        self.predict_satellite(record.name(), record.catalog_number(), &geometry, window)
    }

    /// Evaluates one satellite against the window. `Ok(None)` when it has no
    /// qualifying pass.
    pub fn predict_satellite<G: PassGeometry + ?Sized>(
        &self,
        name: &str,
        catalog_number: &str,
        geometry: &G,
        window: &ObservationWindow,
    ) -> Result<Option<Pass>, PredictError> {
        let events = find_events(
            geometry,
            window,
            self.config.min_elevation_deg,
            self.config.search_step,
        )?;

        let Some(rise_index) = events.iter().position(|e| e.kind == EventKind::Rise) else {
            return Ok(None);
        };
        let rise = events[rise_index].time;

        let mut peak: Option<f64> = None;
        let mut set = None;
        for event in &events[rise_index + 1..] {
            match event.kind {
                EventKind::Culminate => {
                    if peak.map_or(true, |p| event.elevation_deg > p) {
                        peak = Some(event.elevation_deg);
                    }
                }
                EventKind::Set => {
                    set = Some(event.time);
                    break;
                }
                EventKind::Rise => {}
            }
        }

        let Some(set) = set else {
            return Ok(None);
        };
        let duration_min = minutes(set - rise);
        if duration_min < MIN_PASS_DURATION_MIN {
            return Ok(None);
        }

        let sunlit_fraction = self.sunlit_fraction(geometry, rise, set - rise)?;

        Ok(Some(Pass {
            satellite: name.to_string(),
            catalog_number: catalog_number.to_string(),
            rise,
            set,
            rise_offset_min: window.offset_minutes(rise),
            duration_min,
            peak_elevation_deg: peak,
            sunlit_fraction,
            altitude_km: geometry.altitude_km(),
        }))
    }

    /// Percentage of samples taken every `sunlit_step` from `rise` that are
    /// in sunlight.
    fn sunlit_fraction<G: PassGeometry + ?Sized>(
        &self,
        geometry: &G,
        rise: chrono::DateTime<chrono::Utc>,
        duration: Duration,
    ) -> Result<f64, PredictError> {
        let step_ms = self.config.sunlit_step.num_milliseconds();
        if step_ms <= 0 {
            return Err(PredictError::InvalidWindow(
                "sunlit step must be positive".to_string(),
            ));
        }

        let samples = duration.num_milliseconds() / step_ms;
        if samples == 0 {
            return Ok(0.0);
        }

        let mut lit = 0;
        for i in 0..samples {
            let t = rise + Duration::milliseconds(i * step_ms);
            if geometry.is_sunlit(t)? {
                lit += 1;
            }
        }
        Ok(lit as f64 / samples as f64 * 100.0)
    }
}

/// Ascending rise offset; catalog number breaks ties so parallel collection
/// order never leaks into the output.
pub fn sort_passes(passes: &mut [Pass]) {
    passes.sort_by(|a, b| {
        a.rise_offset_min
            .total_cmp(&b.rise_offset_min)
            .then_with(|| a.catalog_number.cmp(&b.catalog_number))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SourceShape;
    use crate::predict::events::tests::ProfileGeometry;
    use crate::predict::geometry::tests::{canaveral, ISS_LINE1, ISS_LINE2};
    use approx::assert_abs_diff_eq;
    use chrono::{DateTime, TimeZone, Utc};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 25, 13, 10, 0).unwrap()
    }

    fn single_pass(start: DateTime<Utc>) -> ProfileGeometry {
        let mut geometry = ProfileGeometry::new(
            start,
            &[(0.0, 0.0), (10.0, 26.0), (15.0, 45.0), (20.0, 26.0), (90.0, 0.0)],
        );
        geometry.sunlit_until_min = 15.0;
        geometry
    }

    fn pass_at(offset: f64, catalog_number: &str) -> Pass {
        Pass {
            satellite: format!("SAT {catalog_number}"),
            catalog_number: catalog_number.to_string(),
            rise: start(),
            set: start(),
            rise_offset_min: offset,
            duration_min: 5.0,
            peak_elevation_deg: None,
            sunlit_fraction: 0.0,
            altitude_km: 500.0,
        }
    }

    #[test]
    fn test_single_pass_scenario() {
        let predictor = PassPredictor::default();
        let window = ObservationWindow::from_minutes(start(), 90).unwrap();

        let pass = predictor
            .predict_satellite("TESTSAT", "99999U", &single_pass(start()), &window)
            .unwrap()
            .unwrap();

        assert_abs_diff_eq!(pass.rise_offset_min, 10.0, epsilon = 0.01);
        assert_abs_diff_eq!(pass.duration_min, 10.0, epsilon = 0.02);
        assert_abs_diff_eq!(pass.peak_elevation_deg.unwrap(), 45.0, epsilon = 0.1);
        assert_abs_diff_eq!(pass.sunlit_fraction, 50.0, epsilon = 1.0);
        assert_eq!(pass.altitude_km, 550.0);
    }

    #[test]
    fn test_short_pass_is_discarded() {
        let geometry = ProfileGeometry::new(
            start(),
            &[(0.0, 0.0), (10.0, 26.0), (10.25, 30.0), (10.5, 26.0), (20.0, 0.0)],
        );
        let window = ObservationWindow::from_minutes(start(), 90).unwrap();

        let coarse = PassPredictor::default();
        assert!(coarse
            .predict_satellite("SHORT", "11111U", &geometry, &window)
            .unwrap()
            .is_none());

        let fine = PassPredictor::new(PredictorConfig {
            search_step: Duration::seconds(5),
            ..PredictorConfig::default()
        });
        assert!(fine
            .predict_satellite("SHORT", "11111U", &geometry, &window)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_peak_keeps_highest_culmination() {
        let geometry = ProfileGeometry::new(
            start(),
            &[(0.0, 0.0), (10.0, 26.0), (13.0, 40.0), (15.0, 30.0), (17.0, 35.0), (22.0, 26.0), (40.0, 0.0)],
        );
        let window = ObservationWindow::from_minutes(start(), 40).unwrap();

        let pass = PassPredictor::default()
            .predict_satellite("HUMP", "22222U", &geometry, &window)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(pass.peak_elevation_deg.unwrap(), 40.0, epsilon = 0.1);
    }

    #[test]
    fn test_second_pass_culmination_not_counted() {
        let geometry = ProfileGeometry::new(
            start(),
            &[(0.0, 0.0), (10.0, 26.0), (15.0, 30.0), (20.0, 26.0), (40.0, 0.0), (60.0, 26.0), (65.0, 80.0), (70.0, 26.0), (90.0, 0.0)],
        );
        let window = ObservationWindow::from_minutes(start(), 90).unwrap();

        let pass = PassPredictor::default()
            .predict_satellite("TWICE", "33333U", &geometry, &window)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(pass.rise_offset_min, 10.0, epsilon = 0.01);
        assert_abs_diff_eq!(pass.peak_elevation_deg.unwrap(), 30.0, epsilon = 0.1);
    }

    #[test]
    fn test_pass_still_up_at_window_end_is_omitted() {
        let geometry = ProfileGeometry::new(start(), &[(0.0, 0.0), (80.0, 26.0), (95.0, 60.0), (110.0, 0.0)]);
        let window = ObservationWindow::from_minutes(start(), 90).unwrap();

        assert!(PassPredictor::default()
            .predict_satellite("LATE", "44444U", &geometry, &window)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_never_above_threshold() {
        let geometry = ProfileGeometry::new(start(), &[(0.0, 0.0), (45.0, 25.9), (90.0, 0.0)]);
        let window = ObservationWindow::from_minutes(start(), 90).unwrap();

        assert!(PassPredictor::default()
            .predict_satellite("LOW", "55555U", &geometry, &window)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_window_across_midnight() {
        let late = Utc.with_ymd_and_hms(2025, 11, 25, 23, 55, 0).unwrap();
        let window = ObservationWindow::from_minutes(late, 90).unwrap();

        let pass = PassPredictor::default()
            .predict_satellite("NIGHT", "66666U", &single_pass(late), &window)
            .unwrap()
            .unwrap();
        assert_abs_diff_eq!(pass.rise_offset_min, 10.0, epsilon = 0.01);
        assert_eq!(pass.rise.date_naive(), late.date_naive().succ_opt().unwrap());
    }

    #[test]
    fn test_passes_sorted_by_rise_then_catalog_number() {
        let mut passes = vec![
            pass_at(30.0, "30000U"),
            pass_at(5.0, "20000U"),
            pass_at(30.0, "10000U"),
        ];
        sort_passes(&mut passes);
        let order: Vec<_> = passes.iter().map(|p| p.catalog_number.as_str()).collect();
        assert_eq!(order, vec!["20000U", "10000U", "30000U"]);
    }

    #[test]
    fn test_catalog_prediction_isolates_bad_records() {
        let text = format!(
            "0 ISS (ZARYA)\n{ISS_LINE1}\n{ISS_LINE2}\n0 BROKEN\n1 99999U garbage\n2 99999 garbage\n"
        );
        let mut catalog = TleCatalog::new();
        assert_eq!(catalog.insert_text(&text, SourceShape::SingleFile), 2);

        let epoch = Utc.with_ymd_and_hms(2008, 9, 20, 0, 0, 0).unwrap();
        let window = ObservationWindow::from_minutes(epoch, 24 * 60).unwrap();
        let passes = PassPredictor::default().predict(&catalog, &canaveral(), &window);

        assert_eq!(passes.len(), 1);
        assert!(passes.iter().all(|p| p.catalog_number == "25544U"));
        for pass in &passes {
            assert!(pass.duration_min >= MIN_PASS_DURATION_MIN);
            assert!(pass.rise_offset_min >= 0.0);
            assert!(pass.set > pass.rise);
            assert!((0.0..=100.0).contains(&pass.sunlit_fraction));
            assert!(pass.altitude_km > 300.0 && pass.altitude_km < 400.0);
            if let Some(peak) = pass.peak_elevation_deg {
                assert!(peak > 26.0 && peak <= 90.0);
            }
        }
    }
}
