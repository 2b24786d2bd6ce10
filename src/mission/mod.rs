//! Hand-off to the external mission-plan engine that turns an exported
//! selection into tracking ephemerides.

mod process;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use thiserror::Error;

pub use process::run_engine;

/// File name of the selection export inside the plan directory.
pub const EXPORT_FILE_NAME: &str = "TLE_export.tle";
/// Prefix of the ephemeris files the engine writes.
pub const EPHEMERIS_PREFIX: &str = "ASATrackingData";

#[derive(Debug, Error)]
pub enum MissionError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no satellites in export {0}")]
    NoSatellites(String),
    #[error("cannot start mission plan for {satellite}: {source}")]
    Spawn {
        satellite: String,
        #[source]
        source: std::io::Error,
    },
    #[error("mission plan for {satellite} failed with exit code {code} (see {log})")]
    EngineFailed {
        satellite: String,
        code: i32,
        log: String,
    },
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> MissionError + '_ {
    move |source| MissionError::Io {
        path: path.display().to_string(),
        source,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissionPlanRequest {
    pub satellites: Vec<String>,
    pub start: DateTime<Utc>,
    pub duration_min: u32,
}

impl MissionPlanRequest {
    /// Every `0 ` header in the export names one satellite to plan.
    pub fn from_export(text: &str, start: DateTime<Utc>, duration_min: u32) -> Self {
        let satellites = text
            .lines()
            .filter(|line| line.starts_with('0'))
            .map(|line| line.get(2..).unwrap_or_default().trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        Self {
            satellites,
            start,
            duration_min,
        }
    }

    pub fn start_time_string(&self) -> String {
        self.start.format("%b %d %Y %H:%M:%S").to_string()
    }

    /// e.g. `2025Nov25__13_10__90`
    pub fn ephemeris_dir_name(&self) -> String {
        format!(
            "{}__{}",
            self.start.format("%Y%b%d__%H_%M"),
            self.duration_min
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MissionOutcome {
    pub ephemeris_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct MissionPlanRunner {
    command: String,
    plan_dir: PathBuf,
    ephemerides_dir: PathBuf,
}

impl MissionPlanRunner {
    pub fn new(command: impl Into<String>, plan_dir: PathBuf, ephemerides_dir: PathBuf) -> Self {
        Self {
            command: command.into(),
            plan_dir,
            ephemerides_dir,
        }
    }

    pub fn export_path(&self) -> PathBuf {
        self.plan_dir.join(EXPORT_FILE_NAME)
    }

    /// Runs the engine once per exported satellite and gathers the
    /// ephemerides it produced into a directory named after the window.
    pub fn run(&self, start: DateTime<Utc>, duration_min: u32) -> Result<MissionOutcome, MissionError> {
        let export_path = self.export_path();
        let export = fs::read_to_string(&export_path).map_err(io_error(&export_path))?;

        let request = MissionPlanRequest::from_export(&export, start, duration_min);
        if request.satellites.is_empty() {
            return Err(MissionError::NoSatellites(export_path.display().to_string()));
        }

        let output_dir = self.plan_dir.join("tmp");
        if output_dir.exists() {
            fs::remove_dir_all(&output_dir).map_err(io_error(&output_dir))?;
        }
        fs::create_dir_all(&output_dir).map_err(io_error(&output_dir))?;

        let result = self
            .run_all(&request, &export_path, &output_dir)
            .and_then(|_| self.collect_ephemerides(&request, &output_dir));

        if let Err(e) = fs::remove_dir_all(&output_dir) {
            log::warn!("Failed to remove {}: {}", output_dir.display(), e);
        }
        result
    }

    fn run_all(
        &self,
        request: &MissionPlanRequest,
        export_path: &Path,
        output_dir: &Path,
    ) -> Result<(), MissionError> {
        let log_dir = self.plan_dir.join("logs");
        for (index, satellite) in request.satellites.iter().enumerate() {
            let env = [
                ("SAT_NAME", satellite.clone()),
                ("START_TIME", request.start_time_string()),
                ("DURATION_MIN", request.duration_min.to_string()),
                ("EXPORT_FILE", export_path.display().to_string()),
                ("OUTPUT_DIR", output_dir.display().to_string()),
            ];
            run_engine(&self.command, &env, &log_dir, index, satellite)?;
        }
        Ok(())
    }

    fn collect_ephemerides(
        &self,
        request: &MissionPlanRequest,
        output_dir: &Path,
    ) -> Result<MissionOutcome, MissionError> {
        let ephemeris_dir = self.ephemerides_dir.join(request.ephemeris_dir_name());
        fs::create_dir_all(&ephemeris_dir).map_err(io_error(&ephemeris_dir))?;

        let mut produced: Vec<PathBuf> = fs::read_dir(output_dir)
            .map_err(io_error(output_dir))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(EPHEMERIS_PREFIX))
            })
            .collect();
        produced.sort();

        let mut files = Vec::with_capacity(produced.len());
        for source in produced {
            let Some(name) = source.file_name() else {
                continue;
            };
            let target = ephemeris_dir.join(name);
            move_file(&source, &target)?;
            files.push(target);
        }

        log::info!(
            "Collected {} ephemeris files into {}",
            files.len(),
            ephemeris_dir.display()
        );
        Ok(MissionOutcome {
            ephemeris_dir,
            files,
        })
    }
}

fn move_file(source: &Path, target: &Path) -> Result<(), MissionError> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }
    fs::copy(source, target).map_err(io_error(target))?;
    fs::remove_file(source).map_err(io_error(source))
}
