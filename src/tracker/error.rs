use thiserror::Error;

use crate::tracker::ephemeris::EphemerisError;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("device error {number}: {message}")]
    Device { number: i32, message: String },
    #[error("malformed reply: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("telescope not connected")]
    NotConnected,
    #[error("no track is active")]
    NotTracking,
    #[error("a track is already active")]
    AlreadyTracking,
    #[error("telescope connection failed: {0}")]
    HardwareConnection(#[source] TransportError),
    #[error("telescope command failed: {0}")]
    HardwareCommand(#[source] TransportError),
    #[error("starting track failed at {command}: {source}")]
    TrackingStart {
        command: String,
        #[source]
        source: TransportError,
    },
    #[error("status request {query} failed: {message}")]
    StatusRequest { query: String, message: String },
    #[error("ephemeris error: {0}")]
    Ephemeris(#[from] EphemerisError),
}
