//! Serializable backtest configuration (TOML).
//!
//! ```toml
//! [backtest]
//! initial_investment = 100000.0
//! cadence = "annual"
//! transition_periods = 6
//! start_date = "2005-01-01"
//!
//! [detector]
//! learning_rate = 0.3
//! sticky_lock = true
//!
//! [data]
//! macro_path = "macro.csv"
//! fund_map_path = "funds.csv"
//! fund_returns_path = "fund_returns.csv"
//! ```
//!
//! Relative data paths are resolved against the config file's directory.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use regimelab_core::detection::DetectorConfig;
use regimelab_core::engine::{RebalanceCadence, SimulatorConfig, DEFAULT_INITIAL_INVESTMENT};

/// Unique identifier for a backtest run (content-addressable hash).
pub type RunId = String;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error(transparent)]
    Simulator(#[from] regimelab_core::domain::ConfigError),
    #[error("start_date {start} is after end_date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },
    #[error("serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Full configuration for one backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestConfig {
    #[serde(default)]
    pub backtest: BacktestSection,
    #[serde(default)]
    pub detector: DetectorConfig,
    pub data: DataSection,
}

/// `[backtest]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BacktestSection {
    pub initial_investment: f64,
    pub cadence: RebalanceCadence,
    /// Spread band changes over this many periods after a regime change.
    pub transition_periods: Option<u32>,
    /// First macro date to simulate (inclusive).
    pub start_date: Option<NaiveDate>,
    /// Last macro date to simulate (inclusive).
    pub end_date: Option<NaiveDate>,
}

impl Default for BacktestSection {
    fn default() -> Self {
        Self {
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            cadence: RebalanceCadence::default(),
            transition_periods: None,
            start_date: None,
            end_date: None,
        }
    }
}

/// `[data]` table: local CSV inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSection {
    /// Monthly indicator snapshots and market proxies.
    pub macro_path: PathBuf,
    /// `fund,asset_class[,expected_return]`.
    pub fund_map_path: PathBuf,
    /// Long-format daily returns `date,fund,return`.
    #[serde(default)]
    pub fund_returns_path: Option<PathBuf>,
    /// `date,return` benchmark period returns.
    #[serde(default)]
    pub benchmark_path: Option<PathBuf>,
}

impl DataSection {
    fn resolve_against(&mut self, base: &Path) {
        let join = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };
        join(&mut self.macro_path);
        join(&mut self.fund_map_path);
        if let Some(p) = self.fund_returns_path.as_mut() {
            join(p);
        }
        if let Some(p) = self.benchmark_path.as_mut() {
            join(p);
        }
    }
}

impl BacktestConfig {
    /// Load and validate a TOML config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml(&content)?;
        if let Some(base) = path.parent() {
            config.data.resolve_against(base);
        }
        Ok(config)
    }

    /// Parse and validate a TOML string. Paths are left as written.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.simulator_config()?;
        if let (Some(start), Some(end)) = (self.backtest.start_date, self.backtest.end_date) {
            if start > end {
                return Err(ConfigError::DateRange { start, end });
            }
        }
        Ok(())
    }

    /// Engine configuration for this run.
    pub fn simulator_config(&self) -> Result<SimulatorConfig, ConfigError> {
        let config = SimulatorConfig::new(self.backtest.initial_investment)?
            .with_cadence(self.backtest.cadence)
            .with_detector(self.detector)?
            .with_transition_periods(self.backtest.transition_periods)?;
        Ok(config)
    }
}
