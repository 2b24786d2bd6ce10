use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::catalog::TleSource;
use crate::mission::{MissionPlanRunner, EXPORT_FILE_NAME};
use crate::predict::{GroundStation, PredictorConfig};
use crate::tracker::TrackerConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No {0} TLE source configured")]
    MissingSource(&'static str),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub station_file: PathBuf,
    #[serde(default)]
    pub tle: TleConfig,
    #[serde(default)]
    pub predict: PredictConfig,
    #[serde(default)]
    pub telescope: TelescopeConfig,
    #[serde(default)]
    pub mission: MissionConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TleConfig {
    pub single_file: Option<PathBuf>,
    pub directory: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PredictConfig {
    #[serde(default = "default_min_elevation")]
    pub min_elevation_deg: f64,
    #[serde(default = "default_search_step")]
    pub search_step_s: u32,
    #[serde(default = "default_sunlit_step")]
    pub sunlit_step_s: u32,
}

fn default_min_elevation() -> f64 {
    26.0
}

fn default_search_step() -> u32 {
    30
}

fn default_sunlit_step() -> u32 {
    5
}

impl Default for PredictConfig {
    fn default() -> Self {
        Self {
            min_elevation_deg: default_min_elevation(),
            search_step_s: default_search_step(),
            sunlit_step_s: default_sunlit_step(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelescopeConfig {
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub device_number: u32,
    #[serde(default = "default_timeout")]
    pub timeout_s: u64,
    #[serde(default = "default_start_altitude")]
    pub start_altitude_deg: f64,
}

fn default_address() -> String {
    "localhost:11111".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_start_altitude() -> f64 {
    30.0
}

impl Default for TelescopeConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            device_number: 0,
            timeout_s: default_timeout(),
            start_altitude_deg: default_start_altitude(),
        }
    }
}

impl TelescopeConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_s)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MissionConfig {
    #[serde(default = "default_mission_command")]
    pub command: String,
    #[serde(default = "default_plan_dir")]
    pub plan_dir: PathBuf,
    #[serde(default = "default_ephemerides_dir")]
    pub ephemerides_dir: PathBuf,
}

fn default_mission_command() -> String {
    "freeflyer-runner SGP4_EPH.MissionPlan".to_string()
}

fn default_plan_dir() -> PathBuf {
    PathBuf::from("missionplans")
}

fn default_ephemerides_dir() -> PathBuf {
    PathBuf::from("ephemerides")
}

impl Default for MissionConfig {
    fn default() -> Self {
        Self {
            command: default_mission_command(),
            plan_dir: default_plan_dir(),
            ephemerides_dir: default_ephemerides_dir(),
        }
    }
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::from_yaml_str(&content, base_dir)
    }

    /// Parses YAML and resolves relative paths against `base_dir`.
    pub fn from_yaml_str(yaml: &str, base_dir: &Path) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        config.resolve(base_dir);
        Ok(config)
    }

    fn resolve(&mut self, base_dir: &Path) {
        let join = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base_dir.join(&*path);
            }
        };
        join(&mut self.station_file);
        if let Some(path) = self.tle.single_file.as_mut() {
            join(path);
        }
        if let Some(path) = self.tle.directory.as_mut() {
            join(path);
        }
        join(&mut self.mission.plan_dir);
        join(&mut self.mission.ephemerides_dir);
    }

    pub fn station(&self) -> Result<GroundStation, ConfigError> {
        GroundStation::from_json_file(&self.station_file)
    }

    pub fn single_file_source(&self) -> Result<TleSource, ConfigError> {
        self.tle
            .single_file
            .clone()
            .map(TleSource::SingleFile)
            .ok_or(ConfigError::MissingSource("single-file"))
    }

    pub fn directory_source(&self) -> Result<TleSource, ConfigError> {
        self.tle
            .directory
            .clone()
            .map(TleSource::Directory)
            .ok_or(ConfigError::MissingSource("directory"))
    }

    pub fn predictor_config(&self) -> PredictorConfig {
        PredictorConfig {
            min_elevation_deg: self.predict.min_elevation_deg,
            search_step: chrono::Duration::seconds(self.predict.search_step_s.into()),
            sunlit_step: chrono::Duration::seconds(self.predict.sunlit_step_s.into()),
        }
    }

    pub fn tracker_config(&self) -> TrackerConfig {
        TrackerConfig {
            start_altitude_deg: self.telescope.start_altitude_deg,
        }
    }

    pub fn export_file(&self) -> PathBuf {
        self.mission.plan_dir.join(EXPORT_FILE_NAME)
    }

    pub fn mission_runner(&self) -> MissionPlanRunner {
        MissionPlanRunner::new(
            self.mission.command.clone(),
            self.mission.plan_dir.clone(),
            self.mission.ephemerides_dir.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_yaml_str("station_file: station.json\n", Path::new("/etc/ogs")).unwrap();
        assert_eq!(config.station_file, PathBuf::from("/etc/ogs/station.json"));
        assert_eq!(config.predictor_config(), PredictorConfig::default());
        assert_eq!(config.tracker_config(), TrackerConfig::default());
        assert_eq!(config.telescope.address, "localhost:11111");
        assert_eq!(config.telescope.timeout(), Duration::from_secs(30));
        assert_eq!(
            config.export_file(),
            PathBuf::from("/etc/ogs/missionplans/TLE_export.tle")
        );
        assert!(matches!(
            config.directory_source(),
            Err(ConfigError::MissingSource("directory"))
        ));
    }

    #[test]
    fn test_full_config() {
        let yaml = r#"
station_file: /srv/station.json
tle:
  single_file: TLE_data/leo.tle
  directory: TLE_data/ogs_tle
predict:
  min_elevation_deg: 20
  search_step_s: 10
telescope:
  address: mount.local:11111
  device_number: 1
  timeout_s: 5
  start_altitude_deg: 25
mission:
  command: "run-plan"
"#;
        let config = Config::from_yaml_str(yaml, Path::new("/opt/ogs")).unwrap();
        assert_eq!(config.station_file, PathBuf::from("/srv/station.json"));
        assert_eq!(
            config.single_file_source().unwrap(),
            TleSource::SingleFile(PathBuf::from("/opt/ogs/TLE_data/leo.tle"))
        );
        assert_eq!(
            config.directory_source().unwrap(),
            TleSource::Directory(PathBuf::from("/opt/ogs/TLE_data/ogs_tle"))
        );

        let predictor = config.predictor_config();
        assert_eq!(predictor.min_elevation_deg, 20.0);
        assert_eq!(predictor.search_step, chrono::Duration::seconds(10));
        assert_eq!(predictor.sunlit_step, chrono::Duration::seconds(5));

        assert_eq!(config.telescope.device_number, 1);
        assert_eq!(config.tracker_config().start_altitude_deg, 25.0);
        assert_eq!(config.mission.command, "run-plan");
        assert_eq!(config.mission.ephemerides_dir, PathBuf::from("/opt/ogs/ephemerides"));
    }

    #[test]
    fn test_missing_station_file_is_error() {
        assert!(matches!(
            Config::from_yaml_str("tle: {}\n", Path::new(".")),
            Err(ConfigError::Yaml(_))
        ));
        assert!(matches!(
            Config::from_file(Path::new("/nonexistent/ogs.yaml")),
            Err(ConfigError::Io { .. })
        ));
    }
}
