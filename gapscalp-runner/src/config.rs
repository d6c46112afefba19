//! Serializable batch run configuration.
//!
//! A run is described by a TOML file:
//!
//! ```toml
//! tickers = ["7203.T", "8267.T"]
//! data_dir = "data"
//! threads = 4
//! timeout_secs = 600
//!
//! [strategy]
//! entry_start = "09:00"
//! entry_end = "09:15"
//! gap_min = -0.03
//! gap_max = 0.01
//! ```
//!
//! Every `[strategy]` field is optional and falls back to its default.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gapscalp_core::config::{ConfigError as StrategyConfigError, StrategyConfig};

/// Errors from loading or validating a run configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("no tickers configured")]
    EmptyTickers,
    #[error("ticker '{0}' listed more than once")]
    DuplicateTicker(String),
    #[error("threads must be at least 1 when set")]
    ZeroThreads,
    #[error("timeout_secs must be at least 1 when set")]
    ZeroTimeout,
    #[error("strategy: {0}")]
    Strategy(#[from] StrategyConfigError),
    #[error("failed to serialize strategy for hashing: {0}")]
    Fingerprint(#[from] serde_json::Error),
}

/// Complete description of a batch run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Simulated in this order; results are reported in this order.
    pub tickers: Vec<String>,

    /// Directory holding `<TICKER>_intraday.csv` and `<TICKER>_daily.csv`.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Worker threads. `None` uses one per available core.
    #[serde(default)]
    pub threads: Option<usize>,

    /// Tickers not started within this many seconds are skipped.
    #[serde(default)]
    pub timeout_secs: Option<u64>,

    #[serde(default)]
    pub strategy: StrategyConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

impl RunConfig {
    /// A config for `tickers` with every other field at its default.
    pub fn with_tickers<I, S>(tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tickers: tickers.into_iter().map(Into::into).collect(),
            data_dir: default_data_dir(),
            threads: None,
            timeout_secs: None,
            strategy: StrategyConfig::default(),
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Fail fast before any per-ticker work starts.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.tickers.is_empty() {
            return Err(ConfigError::EmptyTickers);
        }
        let mut seen = HashSet::new();
        if let Some(dup) = self.tickers.iter().find(|t| !seen.insert(t.as_str())) {
            return Err(ConfigError::DuplicateTicker(dup.clone()));
        }
        if self.threads == Some(0) {
            return Err(ConfigError::ZeroThreads);
        }
        if self.timeout_secs == Some(0) {
            return Err(ConfigError::ZeroTimeout);
        }
        self.strategy.validate()?;
        Ok(())
    }

    /// BLAKE3 fingerprint of the strategy parameters.
    ///
    /// Two runs with identical strategy parameters share a hash regardless
    /// of tickers, paths or thread count.
    pub fn config_hash(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_vec(&self.strategy)?;
        Ok(blake3::hash(&json).to_hex().to_string())
    }
}
