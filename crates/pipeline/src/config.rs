//! Pipeline configuration
//!
//! Layered as defaults, then an optional TOML file, then `NOSHOW_*`
//! environment variables (`__` separates sections, e.g.
//! `NOSHOW_FOREST__N_TREES=200`).

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment, File};
use noshow_core::Result;
use noshow_trainer::ForestParams;
use serde::{Deserialize, Serialize};

const ENV_PREFIX: &str = "NOSHOW";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub store: StoreConfig,
    pub data: DataConfig,
    pub forest: ForestParams,
    pub logging: LoggingConfig,
}

/// Where trained models live
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub directory: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("./models"),
        }
    }
}

/// Appointment CSV to read
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub path: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./appointments.csv"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Fallback filter when `RUST_LOG` is unset
    pub level: String,
    /// `pretty` or `compact`
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl PipelineConfig {
    /// Load configuration. A `file` that was named explicitly must exist.
    pub fn load(file: Option<&Path>) -> std::result::Result<Self, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = file {
            builder = builder.add_source(File::from(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    pub fn validate(&self) -> Result<()> {
        self.forest.validate()
    }
}
