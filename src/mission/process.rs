use std::{
    fs::{self, OpenOptions},
    path::Path,
    process::{Command as StdCommand, Stdio},
};

use crate::mission::MissionError;

/// Runs the mission-plan engine once through `sh -c`, blocking until it
/// exits. Output is captured in `<index>_stdout.log` / `<index>_stderr.log`
/// under `log_dir`.
pub fn run_engine(
    cmd: &str,
    env: &[(&str, String)],
    log_dir: &Path,
    index: usize,
    satellite: &str,
) -> Result<(), MissionError> {
    fs::create_dir_all(log_dir).map_err(|source| MissionError::Io {
        path: log_dir.display().to_string(),
        source,
    })?;

    let stdout_path = log_dir.join(format!("{:03}_stdout.log", index));
    let stderr_path = log_dir.join(format!("{:03}_stderr.log", index));

    let open = |path: &Path| {
        OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|source| MissionError::Io {
                path: path.display().to_string(),
                source,
            })
    };
    let stdout_file = open(&stdout_path)?;
    let stderr_file = open(&stderr_path)?;

    log::info!("Running mission plan for {} (run {}): {}", satellite, index, cmd);

    let mut command = StdCommand::new("sh");
    command
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::from(stdout_file))
        .stderr(Stdio::from(stderr_file));
    for (key, value) in env {
        command.env(key, value);
    }

    let status = command
        .status()
        .map_err(|source| MissionError::Spawn {
            satellite: satellite.to_string(),
            source,
        })?;

    let exit_code = status.code().unwrap_or(-1);
    log::info!("Mission plan for {} exited with code {}", satellite, exit_code);

    if exit_code != 0 {
        return Err(MissionError::EngineFailed {
            satellite: satellite.to_string(),
            code: exit_code,
            log: stderr_path.display().to_string(),
        });
    }
    Ok(())
}
