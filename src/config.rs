//! Configuration.
//!
//! Precedence, lowest first: built-in defaults, the TOML file at
//! `<config_dir>/taskboard/config.toml`, environment variables
//! (`TASKBOARD_DATA_DIR`, `TASKBOARD_LOG`), command-line flags.
//!
//! ```toml
//! data_dir = "/home/me/.local/share/taskboard"
//! log_level = "info"
//! ```

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::{Error, Result};

pub const DATA_DIR_ENV: &str = "TASKBOARD_DATA_DIR";
pub const LOG_LEVEL_ENV: &str = "TASKBOARD_LOG";

const APP_DIR: &str = "taskboard";
const DEFAULT_LOG_LEVEL: &str = "warn";

/// Contents of `config.toml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ConfigFile {
    /// Read and parse a config file. A missing file is an empty config.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&text).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

/// Values that override the file, from the environment or the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_path: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub log_level: Option<String>,
}

impl ConfigOverrides {
    /// Overrides taken from the process environment.
    pub fn from_env() -> Self {
        Self {
            config_path: None,
            data_dir: std::env::var_os(DATA_DIR_ENV).map(PathBuf::from),
            log_level: std::env::var(LOG_LEVEL_ENV).ok(),
        }
    }

    /// Layer `other` on top of `self`.
    pub fn merge(self, other: ConfigOverrides) -> Self {
        Self {
            config_path: other.config_path.or(self.config_path),
            data_dir: other.data_dir.or(self.data_dir),
            log_level: other.log_level.or(self.log_level),
        }
    }
}

/// Fully resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let file = match overrides.config_path.clone().or_else(default_config_path) {
            Some(path) => ConfigFile::load(&path)?,
            None => ConfigFile::default(),
        };
        Self::from_layers(file, overrides)
    }

    pub fn from_layers(file: ConfigFile, overrides: ConfigOverrides) -> Result<Self> {
        let data_dir = overrides
            .data_dir
            .or(file.data_dir)
            .or_else(default_data_dir)
            .ok_or_else(|| {
                Error::Config(format!("no data directory available; set {DATA_DIR_ENV}"))
            })?;
        let log_level = overrides
            .log_level
            .or(file.log_level)
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Ok(Self { data_dir, log_level })
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join(APP_DIR).join("config.toml"))
}

pub fn default_data_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(APP_DIR))
}
