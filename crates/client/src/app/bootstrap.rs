use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use plaza_engine::{ConfigError, EngineConfig};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::scenario::Scenario;

const CONFIG_ENV_VAR: &str = "PLAZA_CONFIG";
const SCENARIO_ENV_VAR: &str = "PLAZA_SCENARIO";

#[derive(Debug, Error)]
pub(crate) enum AppError {
    #[error("no scenario given; pass a path as the first argument or set {env_var}")]
    MissingScenario { env_var: &'static str },
    #[error("failed to read {what} '{}': {source}", .path.display())]
    Read {
        what: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {what} json{}: {source}", location_suffix(.location))]
    Parse {
        what: &'static str,
        location: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid engine config: {0}")]
    Config(#[from] ConfigError),
    #[error("invalid scenario: {0}")]
    Scenario(String),
    #[error("failed to encode summary json: {0}")]
    Summary(#[source] serde_json::Error),
}

fn location_suffix(location: &str) -> String {
    if location.is_empty() || location == "." {
        String::new()
    } else {
        format!(" at {location}")
    }
}

pub(crate) struct AppWiring {
    pub(crate) config: EngineConfig,
    pub(crate) scenario: Scenario,
}

pub(crate) fn build_app() -> Result<AppWiring, AppError> {
    init_tracing();
    info!("=== Plaza Startup ===");

    let config = match std::env::var_os(CONFIG_ENV_VAR) {
        Some(path) => load_config(Path::new(&path))?,
        None => EngineConfig::default(),
    };
    config.validate()?;

    let scenario_path = std::env::args_os()
        .nth(1)
        .or_else(|| std::env::var_os(SCENARIO_ENV_VAR))
        .map(PathBuf::from)
        .ok_or(AppError::MissingScenario {
            env_var: SCENARIO_ENV_VAR,
        })?;
    let scenario = load_scenario(&scenario_path)?;
    info!(
        path = %scenario_path.display(),
        events = scenario.timeline.len(),
        windows = scenario.windows.len(),
        "scenario_loaded"
    );

    Ok(AppWiring { config, scenario })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

pub(crate) fn load_config(path: &Path) -> Result<EngineConfig, AppError> {
    let raw = read_file("config", path)?;
    parse_json("config", &raw)
}

pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, AppError> {
    let raw = read_file("scenario", path)?;
    let scenario: Scenario = parse_json("scenario", &raw)?;
    scenario.validate().map_err(AppError::Scenario)?;
    Ok(scenario)
}

fn read_file(what: &'static str, path: &Path) -> Result<String, AppError> {
    fs::read_to_string(path).map_err(|source| AppError::Read {
        what,
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn parse_json<T: DeserializeOwned>(
    what: &'static str,
    raw: &str,
) -> Result<T, AppError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
        let location = error.path().to_string();
        AppError::Parse {
            what,
            location,
            source: error.into_inner(),
        }
    })
}
