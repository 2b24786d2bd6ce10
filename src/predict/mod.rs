mod error;
mod events;
mod geometry;
mod ground_station;
mod pass_finder;
mod types;

pub use error::PredictError;
pub use events::find_events;
pub use geometry::{semi_major_axis_earth_radii, PassGeometry, Sgp4Geometry};
pub use ground_station::GroundStation;
pub use pass_finder::{sort_passes, PassPredictor, PredictorConfig, MIN_PASS_DURATION_MIN};
pub use types::{EventKind, ObservationWindow, Pass, VisibilityEvent};
