mod controller;
pub mod ephemeris;
mod error;
pub mod telemetry;
mod transport;

pub use controller::{
    ControllerState, TelescopeSession, TrackerConfig, TrackingController, ACTION_EPHEMERIS_LINES,
    ACTION_START, ACTION_START_ALTITUDE, ACTION_STOP, QUERY_MOUNT_STATUS, QUERY_SATELLITE_STATUS,
};
pub use ephemeris::{EphemerisError, EphemerisRecord};
pub use error::{TrackerError, TransportError};
pub use telemetry::{MountPosition, MountTelemetry, SatelliteTelemetry, TrackingQuality};
pub use transport::{AlpacaTransport, MountTransport};
