//! Configuration file loading.
//!
//! Search order:
//! 1. Explicit `--config` path (must exist)
//! 2. `./stratus.toml`
//! 3. `<data_dir>/config.toml`
//! 4. Defaults

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::{debug, info};
use stratus_core::config::AppConfig;
use thiserror::Error;

const LOCAL_CONFIG: &str = "stratus.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to parse TOML configuration {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Missing configuration file: {0}")]
    MissingFile(PathBuf),

    #[error("Failed to read configuration: {0}")]
    Io(#[from] io::Error),
}

/// Find and load the configuration.
///
/// `data_dir` is where the fallback `config.toml` is looked up; when `None`
/// the default data directory is used.
pub fn load_config(
    explicit_path: Option<&Path>,
    data_dir: Option<&Path>,
) -> Result<AppConfig, ConfigError> {
    if let Some(path) = explicit_path {
        info!(path = path.display().to_string(); "Loading configuration from explicit path");
        return load_config_file(path);
    }

    let local = Path::new(LOCAL_CONFIG);
    if local.exists() {
        info!(path = LOCAL_CONFIG; "Loading configuration from local path");
        return load_config_file(local);
    }

    let data_config = data_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(stratus_core::data_dir)
        .join("config.toml");
    if data_config.exists() {
        info!(path = data_config.display().to_string(); "Loading configuration from data directory");
        return load_config_file(&data_config);
    }

    debug!("No configuration file found, using default configuration");
    Ok(AppConfig::default())
}

fn load_config_file(path: &Path) -> Result<AppConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::MissingFile(path.to_path_buf()));
    }

    let content = fs::read_to_string(path)?;
    toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
