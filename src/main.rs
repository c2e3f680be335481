#![deny(clippy::all)]

mod app;
mod assist;
mod clipboard;
mod console;
mod error;
mod fields;
mod session;
mod store;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use app::{App, JobDelays};
use assist::SimulatedAssistant;
use error::AppError;
use session::{SessionRepository, SystemClock};
use store::{ConfigStore, FileStorage};

/// Environment variable overriding the storage directory
const DATA_DIR_ENV: &str = "MEDSCRIBE_DATA_DIR";

/// Application configuration
#[derive(serde::Deserialize)]
struct Config {
    storage: StorageConfig,
    jobs: JobsConfig,
}

#[derive(serde::Deserialize)]
struct StorageConfig {
    #[serde(default)]
    data_dir: String,
}

#[derive(serde::Deserialize)]
struct JobsConfig {
    stop_recording_ms: u64,
    upload_ms: u64,
    drug_check_ms: u64,
    recommendations_ms: u64,
    analysis_ms: u64,
}

impl From<&JobsConfig> for JobDelays {
    fn from(jobs: &JobsConfig) -> Self {
        Self {
            stop_recording: Duration::from_millis(jobs.stop_recording_ms),
            upload: Duration::from_millis(jobs.upload_ms),
            drug_check: Duration::from_millis(jobs.drug_check_ms),
            recommendations: Duration::from_millis(jobs.recommendations_ms),
            analysis: Duration::from_millis(jobs.analysis_ms),
        }
    }
}

/// Load configuration from embedded config.toml
fn load_config() -> Result<Config, AppError> {
    const CONFIG_TOML: &str = include_str!("../config.toml");
    let config: Config = toml::from_str(CONFIG_TOML)?;
    Ok(config)
}

/// Pick the storage directory: environment, then config.toml, then the platform default
fn storage_dir(config: &StorageConfig) -> Result<PathBuf, AppError> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|d| !d.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    if !config.data_dir.trim().is_empty() {
        return Ok(PathBuf::from(config.data_dir.trim()));
    }
    FileStorage::default_dir()
        .ok_or_else(|| AppError::Config("could not find a config directory".to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they don't interleave with the console
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    // Load configuration from embedded config.toml
    let config = load_config()?;

    let storage = FileStorage::new(storage_dir(&config.storage)?);
    info!("Session storage: {:?}", storage.dir());

    let repo = SessionRepository::open(ConfigStore::new(storage), SystemClock);
    let app = App::new(repo, JobDelays::from(&config.jobs));

    console::run(app, Arc::new(SimulatedAssistant)).await?;

    Ok(())
}
