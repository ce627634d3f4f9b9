//! TOML-based configuration.
//!
//! Example configuration:
//! ```toml
//! id_max = 15000
//!
//! [worker]
//! path = "./analysis-worker"
//! args = ["--stdio"]
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::id::DEFAULT_ID_MAX;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Upper bound of the correlation-id space. Larger values make
    /// allocation collisions rarer; correctness does not depend on it.
    pub id_max: u32,

    /// Worker process configuration.
    pub worker: WorkerSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            id_max: DEFAULT_ID_MAX,
            worker: WorkerSettings::default(),
        }
    }
}

/// Worker process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Path to the worker binary.
    pub path: PathBuf,

    /// Arguments passed to the worker.
    pub args: Vec<String>,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("analysis-worker"),
            args: Vec::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str(&contents)?)
    }

    /// Default settings pointed at a specific worker binary.
    pub fn for_worker(path: impl Into<PathBuf>) -> Self {
        Self {
            worker: WorkerSettings {
                path: path.into(),
                args: Vec::new(),
            },
            ..Self::default()
        }
    }
}
