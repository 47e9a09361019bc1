//! Experiment configuration.
//!
//! A TOML file with two tables:
//!
//! ```toml
//! [splitter]
//! n_splits = 5
//! train_size = 0.8
//! margin = 0
//!
//! [run]
//! category = "Local Model"
//! company = "204"
//! plant = "O"
//! features = "Chemical"
//! model = "LSTM"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cv::{BlockingTimeSeriesSplit, SplitError};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error(transparent)]
    Split(#[from] SplitError),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Blocking splitter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitterConfig {
    /// Number of folds (blocks).
    pub n_splits: usize,
    /// Fraction of each block used for training, in (0, 1].
    pub train_size: f64,
    /// Samples skipped between train and test windows.
    pub margin: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            n_splits: 5,
            train_size: 0.8,
            margin: 0,
        }
    }
}

impl SplitterConfig {
    /// Build a validated splitter.
    pub fn build(&self) -> Result<BlockingTimeSeriesSplit, SplitError> {
        BlockingTimeSeriesSplit::new(self.n_splits, self.train_size, self.margin)
    }

    /// Compact parameter string for result tables.
    pub fn params_json(&self) -> String {
        serde_json::json!({
            "N_Splits": self.n_splits,
            "Train_Size": self.train_size,
            "Margin": self.margin,
        })
        .to_string()
    }
}

/// Descriptive fields attached to every row of a results table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunMetadata {
    pub category: String,
    pub company: String,
    pub plant: String,
    pub features: String,
    pub model: String,
    /// Additional columns, emitted in key order.
    pub extra: BTreeMap<String, String>,
}

impl Default for RunMetadata {
    fn default() -> Self {
        Self {
            category: "Local Model".to_string(),
            company: String::new(),
            plant: String::new(),
            features: String::new(),
            model: String::new(),
            extra: BTreeMap::new(),
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExperimentConfig {
    pub splitter: SplitterConfig,
    pub run: RunMetadata,
}

impl ExperimentConfig {
    /// Load configuration from a TOML file.
    ///
    /// The splitter parameters are validated before returning.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ExperimentConfig = toml::from_str(&content)?;
        config.splitter.build()?;
        Ok(config)
    }

    /// Load configuration from file or use default.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Save configuration to file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Write the default configuration to `path`.
    pub fn create_default<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::default().save(path)
    }

    /// Validated splitter for this configuration.
    pub fn splitter(&self) -> ConfigResult<BlockingTimeSeriesSplit> {
        Ok(self.splitter.build()?)
    }
}
