use std::path::{Path, PathBuf};

use log::{debug, info, warn};
use serde::Serialize;

use crate::predict::GroundStation;
use crate::tracker::ephemeris::{parse_records, read_lines, serialize_lines};
use crate::tracker::error::TrackerError;
use crate::tracker::telemetry::{MountPosition, MountTelemetry, SatelliteTelemetry, TrackingQuality};
use crate::tracker::transport::MountTransport;

pub const ACTION_EPHEMERIS_LINES: &str = "sat:ephlines";
pub const ACTION_START_ALTITUDE: &str = "sat:startalt";
pub const ACTION_START: &str = "sat:start";
pub const ACTION_STOP: &str = "sat:stop";
pub const QUERY_MOUNT_STATUS: &str = "GetTelStatus";
pub const QUERY_SATELLITE_STATUS: &str = "getSatStatus";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrackerConfig {
    /// Minimum elevation handed to the mount when a track starts.
    pub start_altitude_deg: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            start_altitude_deg: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, strum_macros::Display)]
pub enum ControllerState {
    Disconnected,
    Connected,
    ConnectedTracking,
}

/// State that only exists while the telescope is connected.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TelescopeSession {
    pub tracking: bool,
    pub ephemeris: Option<PathBuf>,
    pub position: Option<MountPosition>,
    pub quality: Option<TrackingQuality>,
}

pub struct TrackingController<T: MountTransport> {
    transport: T,
    station: GroundStation,
    config: TrackerConfig,
    session: Option<TelescopeSession>,
}

impl<T: MountTransport> TrackingController<T> {
    pub fn new(transport: T, station: GroundStation, config: TrackerConfig) -> Self {
        Self {
            transport,
            station,
            config,
            session: None,
        }
    }

    pub fn state(&self) -> ControllerState {
        match &self.session {
            None => ControllerState::Disconnected,
            Some(session) if session.tracking => ControllerState::ConnectedTracking,
            Some(_) => ControllerState::Connected,
        }
    }

    pub fn session(&self) -> Option<&TelescopeSession> {
        self.session.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn connect(&mut self) -> Result<(), TrackerError> {
        if self.session.is_some() {
            return Ok(());
        }

        self.transport
            .connect()
            .await
            .map_err(TrackerError::HardwareConnection)?;

        self.session = Some(TelescopeSession::default());
        info!("Connected to telescope");
        Ok(())
    }

    pub async fn disconnect(&mut self) -> Result<(), TrackerError> {
        if self.session.is_none() {
            return Err(TrackerError::NotConnected);
        }

        self.transport
            .disconnect()
            .await
            .map_err(TrackerError::HardwareCommand)?;

        self.session = None;
        info!("Disconnected from telescope");
        Ok(())
    }

    /// Uploads the ephemeris at `path` and starts following it.
    pub async fn start_track(&mut self, path: &Path) -> Result<(), TrackerError> {
        match &self.session {
            None => return Err(TrackerError::NotConnected),
            Some(session) if session.tracking => return Err(TrackerError::AlreadyTracking),
            Some(_) => {}
        }

        let lines = read_lines(path)?;
        let payload = serialize_lines(&lines)?;

        let records = parse_records(&lines);
        if let (Some(first), Some(last)) = (records.first(), records.last()) {
            debug!("Ephemeris {} starts {:?}", path.display(), first);
            debug!("Ephemeris {} ends {:?}", path.display(), last);
        }

        let start_altitude = self.config.start_altitude_deg.to_string();
        let commands = [
            (ACTION_EPHEMERIS_LINES, payload.as_str()),
            (ACTION_START_ALTITUDE, start_altitude.as_str()),
            (ACTION_START, ""),
        ];
        for (command, parameters) in commands {
            self.transport
                .action(command, parameters)
                .await
                .map_err(|source| TrackerError::TrackingStart {
                    command: command.to_string(),
                    source,
                })?;
        }

        if let Some(session) = self.session.as_mut() {
            session.tracking = true;
            session.ephemeris = Some(path.to_path_buf());
        }
        info!("Tracking started with {} ephemeris lines", lines.len());
        Ok(())
    }

    /// Like [`start_track`](Self::start_track), but disconnects when the
    /// track cannot be started. The start error is returned either way.
    pub async fn start_track_or_disconnect(&mut self, path: &Path) -> Result<(), TrackerError> {
        let Err(e) = self.start_track(path).await else {
            return Ok(());
        };
        if self.session.is_some() {
            if let Err(disconnect) = self.disconnect().await {
                warn!("Disconnect after failed start also failed: {}", disconnect);
            }
        }
        Err(e)
    }

    pub async fn stop_track(&mut self) -> Result<(), TrackerError> {
        match &self.session {
            None => return Err(TrackerError::NotConnected),
            Some(session) if !session.tracking => return Err(TrackerError::NotTracking),
            Some(_) => {}
        }

        self.transport
            .action(ACTION_STOP, "")
            .await
            .map_err(TrackerError::HardwareCommand)?;

        if let Some(session) = self.session.as_mut() {
            session.tracking = false;
            session.ephemeris = None;
        }
        info!("Tracking stopped");
        Ok(())
    }

    /// Polls both telemetry queries and caches the decoded result. Nothing
    /// is cached unless both replies decode.
    pub async fn update_status(&mut self) -> Result<TelescopeSession, TrackerError> {
        if self.session.is_none() {
            return Err(TrackerError::NotConnected);
        }

        let mount: MountTelemetry = self.query(QUERY_MOUNT_STATUS).await?;
        let satellite: SatelliteTelemetry = self.query(QUERY_SATELLITE_STATUS).await?;

        let position = MountPosition::from_telemetry(&mount, &self.station);
        let quality = TrackingQuality::from(&satellite);

        let session = self.session.as_mut().ok_or(TrackerError::NotConnected)?;
        session.position = Some(position);
        session.quality = Some(quality);
        Ok(session.clone())
    }

    async fn query<R: serde::de::DeserializeOwned>(&mut self, query: &str) -> Result<R, TrackerError> {
        let reply = self
            .transport
            .action(query, "")
            .await
            .map_err(|e| TrackerError::StatusRequest {
                query: query.to_string(),
                message: e.to_string(),
            })?;

        serde_json::from_str(&reply).map_err(|e| TrackerError::StatusRequest {
            query: query.to_string(),
            message: format!("cannot decode {reply:?}: {e}"),
        })
    }
}
