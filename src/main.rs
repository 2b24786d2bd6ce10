use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{DateTime, Duration, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use thiserror::Error;

use ogs_tracker::catalog::{CatalogError, TleCatalog};
use ogs_tracker::config::{Config, ConfigError};
use ogs_tracker::mission::MissionError;
use ogs_tracker::predict::{ObservationWindow, PassPredictor, PredictError};
use ogs_tracker::selection::{export_selection, write_export, PassFilter};
use ogs_tracker::tracker::ephemeris::{parse_records, read_lines};
use ogs_tracker::tracker::{
    AlpacaTransport, EphemerisError, TrackerError, TrackingController, TransportError,
};

#[derive(Parser)]
#[command(name = "ogs-tracker")]
#[command(about = "LEO pass prediction and telescope tracking for an optical ground station")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Source {
    Single,
    Directory,
}

#[derive(Subcommand)]
enum Commands {
    /// List passes above the minimum elevation
    Predict {
        #[arg(long)]
        config: PathBuf,
        #[arg(long, value_enum, default_value = "single")]
        source: Source,
        /// Window start (RFC 3339), defaults to now
        #[arg(long)]
        start: Option<String>,
        #[arg(long, default_value = "90m")]
        duration: String,
        #[arg(long)]
        min_peak: Option<f64>,
        #[arg(long)]
        min_sunlit: Option<f64>,
        #[arg(long)]
        max_rise_offset: Option<f64>,
        /// Catalog numbers to write to the mission-plan export file
        #[arg(long, value_delimiter = ',')]
        export: Vec<String>,
        #[arg(long)]
        json: bool,
    },
    /// Print the decoded rows of an ephemeris file
    Ephemeris {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },
    /// Generate ephemerides for the exported selection
    Mission {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        start: Option<String>,
        #[arg(long, default_value = "90m")]
        duration: String,
    },
    /// Start tracking an ephemeris and poll telemetry
    Track {
        #[arg(long)]
        config: PathBuf,
        #[arg(long)]
        ephemeris: PathBuf,
        #[arg(long, default_value_t = 10)]
        polls: u32,
        #[arg(long, default_value = "1s")]
        interval: String,
        /// Stop the track before disconnecting
        #[arg(long)]
        stop: bool,
    },
    /// Connect, read telemetry once and disconnect
    Status {
        #[arg(long)]
        config: PathBuf,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error("{0}")]
    Argument(String),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Predict(#[from] PredictError),
    #[error(transparent)]
    Ephemeris(#[from] EphemerisError),
    #[error(transparent)]
    Mission(#[from] MissionError),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Predict {
            config,
            source,
            start,
            duration,
            min_peak,
            min_sunlit,
            max_rise_offset,
            export,
            json,
        } => {
            let filter = PassFilter {
                min_peak_elevation_deg: min_peak,
                min_sunlit_fraction: min_sunlit,
                max_rise_offset_min: max_rise_offset,
            };
            predict(&config, source, start.as_deref(), &duration, &filter, &export, json)
        }
        Commands::Ephemeris { file, json } => ephemeris(&file, json),
        Commands::Mission {
            config,
            start,
            duration,
        } => mission(&config, start.as_deref(), &duration),
        Commands::Track {
            config,
            ephemeris,
            polls,
            interval,
            stop,
        } => track(&config, &ephemeris, polls, &interval, stop).await,
        Commands::Status { config } => status(&config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn parse_start(s: Option<&str>) -> Result<DateTime<Utc>, CliError> {
    match s {
        None => Ok(Utc::now()),
        Some(s) => DateTime::parse_from_rfc3339(s.trim())
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| CliError::Argument(format!("invalid start time {s:?}: {e}"))),
    }
}

fn parse_duration(s: &str) -> Result<Duration, CliError> {
    humantime::parse_duration(s.trim())
        .map_err(|e| e.to_string())
        .and_then(|d| Duration::from_std(d).map_err(|e| e.to_string()))
        .map_err(|e| CliError::Argument(format!("invalid duration {s:?}: {e}")))
}

fn predict(
    config_path: &Path,
    source: Source,
    start: Option<&str>,
    duration: &str,
    filter: &PassFilter,
    export: &[String],
    json: bool,
) -> Result<(), CliError> {
    let config = Config::from_file(config_path)?;
    let station = config.station()?;
    let window = ObservationWindow::new(parse_start(start)?, parse_duration(duration)?)?;

    let tle_source = match source {
        Source::Single => config.single_file_source()?,
        Source::Directory => config.directory_source()?,
    };
    match tle_source.age() {
        Ok(age) => log::info!("TLE source is {} days old", age.num_days()),
        Err(e) => log::warn!("Could not read TLE source age: {}", e),
    }
    let mut catalog = TleCatalog::new();
    catalog.load(&[tle_source])?;

    let passes = PassPredictor::new(config.predictor_config()).predict(&catalog, &station, &window);
    let passes = filter.apply(passes);

    if json {
        println!("{}", serde_json::to_string_pretty(&passes)?);
    } else {
        println!(
            "{:<24} {:<8} {:>12} {:>11} {:>9} {:>12} {:>9}",
            "NAME", "NORAD", "RISE", "DURATION", "SUNLIT", "ALTITUDE", "PEAK"
        );
        for pass in &passes {
            println!("{}", pass);
        }
    }

    if !export.is_empty() {
        let text = export_selection(&catalog, export)?;
        write_export(&config.export_file(), &text)?;
    }
    Ok(())
}

fn ephemeris(path: &Path, json: bool) -> Result<(), CliError> {
    let records = parse_records(&read_lines(path)?);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    println!(
        "{:<26} {:>14} {:>12} {:>12} {:>12} {:>12}",
        "TIME", "MJD", "RA", "DEC", "AZI", "ELE"
    );
    for record in &records {
        let time = record
            .time()
            .map(|t| t.format("%Y-%m-%d %H:%M:%S%.3f").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<26} {:>14.8} {:>12.6} {:>12.6} {:>12.6} {:>12.6}",
            time, record.mjd, record.ra_deg, record.dec_deg, record.azimuth_deg, record.elevation_deg
        );
    }
    Ok(())
}

fn mission(config_path: &Path, start: Option<&str>, duration: &str) -> Result<(), CliError> {
    let config = Config::from_file(config_path)?;
    let start = parse_start(start)?;
    let duration_min = u32::try_from(parse_duration(duration)?.num_minutes())
        .map_err(|e| CliError::Argument(format!("invalid duration {duration:?}: {e}")))?;

    let outcome = config.mission_runner().run(start, duration_min)?;
    for file in &outcome.files {
        println!("{}", file.display());
    }
    Ok(())
}

fn connect_controller(config: &Config) -> Result<TrackingController<AlpacaTransport>, CliError> {
    let transport = AlpacaTransport::new(
        &config.telescope.address,
        config.telescope.device_number,
        config.telescope.timeout(),
    )?;
    Ok(TrackingController::new(
        transport,
        config.station()?,
        config.tracker_config(),
    ))
}

async fn print_status(controller: &mut TrackingController<AlpacaTransport>) -> Result<(), CliError> {
    let session = controller.update_status().await?;
    println!("{}", serde_json::to_string(&session)?);
    Ok(())
}

async fn track(
    config_path: &Path,
    ephemeris: &Path,
    polls: u32,
    interval: &str,
    stop: bool,
) -> Result<(), CliError> {
    let config = Config::from_file(config_path)?;
    let interval = parse_duration(interval)?
        .to_std()
        .map_err(|e| CliError::Argument(e.to_string()))?;

    let mut controller = connect_controller(&config)?;
    controller.connect().await?;
    controller.start_track_or_disconnect(ephemeris).await?;

    for poll in 0..polls {
        if poll > 0 {
            tokio::time::sleep(interval).await;
        }
        if let Err(e) = print_status(&mut controller).await {
            log::warn!("Status poll {} failed: {}", poll + 1, e);
        }
    }

    let stopped = if stop {
        controller.stop_track().await
    } else {
        Ok(())
    };
    controller.disconnect().await?;
    Ok(stopped?)
}

async fn status(config_path: &Path) -> Result<(), CliError> {
    let config = Config::from_file(config_path)?;
    let mut controller = connect_controller(&config)?;
    controller.connect().await?;

    let result = print_status(&mut controller).await;
    controller.disconnect().await?;
    result
}
