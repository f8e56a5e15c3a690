//! Simulator configuration, validated at construction.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::detection::DetectorConfig;
use crate::domain::ConfigError;

pub const DEFAULT_INITIAL_INVESTMENT: f64 = 100_000.0;

/// Calendar rule that forces a rebalance independent of regime changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceCadence {
    /// Rebalance every period.
    EveryPeriod,
    /// First period of each calendar quarter.
    Quarterly,
    /// First period of each calendar year.
    #[default]
    Annual,
    /// Only on regime changes and band breaches.
    SignalOnly,
}

impl RebalanceCadence {
    /// Whether moving from `previous` to `current` crosses this cadence's boundary.
    pub fn is_due(self, previous: NaiveDate, current: NaiveDate) -> bool {
        match self {
            RebalanceCadence::EveryPeriod => true,
            RebalanceCadence::Quarterly => {
                previous.year() != current.year() || previous.month0() / 3 != current.month0() / 3
            }
            RebalanceCadence::Annual => previous.year() != current.year(),
            RebalanceCadence::SignalOnly => false,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "every_period" | "monthly" => Some(RebalanceCadence::EveryPeriod),
            "quarterly" => Some(RebalanceCadence::Quarterly),
            "annual" | "yearly" => Some(RebalanceCadence::Annual),
            "signal_only" | "none" => Some(RebalanceCadence::SignalOnly),
            _ => None,
        }
    }
}

/// Configuration for a single simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub initial_investment: f64,
    pub cadence: RebalanceCadence,
    pub detector: DetectorConfig,
    /// Interpolate bands over this many periods after a regime change.
    /// `None` switches straight to the new regime's bands.
    pub transition_periods: Option<u32>,
}

impl SimulatorConfig {
    pub fn new(initial_investment: f64) -> Result<Self, ConfigError> {
        let config = Self {
            initial_investment,
            cadence: RebalanceCadence::default(),
            detector: DetectorConfig::production(),
            transition_periods: None,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_cadence(mut self, cadence: RebalanceCadence) -> Self {
        self.cadence = cadence;
        self
    }

    pub fn with_detector(mut self, detector: DetectorConfig) -> Result<Self, ConfigError> {
        detector.validate()?;
        self.detector = detector;
        Ok(self)
    }

    pub fn with_transition_periods(mut self, periods: Option<u32>) -> Result<Self, ConfigError> {
        if periods == Some(0) {
            return Err(ConfigError::TransitionPeriods);
        }
        self.transition_periods = periods;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.initial_investment.is_finite() && self.initial_investment > 0.0) {
            return Err(ConfigError::InitialInvestment(self.initial_investment));
        }
        if self.transition_periods == Some(0) {
            return Err(ConfigError::TransitionPeriods);
        }
        self.detector.validate()
    }
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            initial_investment: DEFAULT_INITIAL_INVESTMENT,
            cadence: RebalanceCadence::default(),
            detector: DetectorConfig::production(),
            transition_periods: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    #[test]
    fn annual_fires_on_year_change() {
        assert!(RebalanceCadence::Annual.is_due(d(2020, 12), d(2021, 1)));
        assert!(!RebalanceCadence::Annual.is_due(d(2021, 1), d(2021, 2)));
    }

    #[test]
    fn quarterly_fires_on_quarter_change() {
        assert!(RebalanceCadence::Quarterly.is_due(d(2021, 3), d(2021, 4)));
        assert!(!RebalanceCadence::Quarterly.is_due(d(2021, 4), d(2021, 5)));
        assert!(RebalanceCadence::Quarterly.is_due(d(2020, 12), d(2021, 1)));
    }

    #[test]
    fn signal_only_never_fires() {
        assert!(!RebalanceCadence::SignalOnly.is_due(d(2020, 12), d(2021, 1)));
        assert!(RebalanceCadence::EveryPeriod.is_due(d(2021, 1), d(2021, 2)));
    }

    #[test]
    fn parse_accepts_aliases() {
        assert_eq!(RebalanceCadence::parse("monthly"), Some(RebalanceCadence::EveryPeriod));
        assert_eq!(RebalanceCadence::parse("signal-only"), Some(RebalanceCadence::SignalOnly));
        assert_eq!(RebalanceCadence::parse("weekly"), None);
    }

    #[test]
    fn rejects_bad_investment_and_zero_transition() {
        assert_eq!(SimulatorConfig::new(0.0), Err(ConfigError::InitialInvestment(0.0)));
        assert!(SimulatorConfig::new(f64::INFINITY).is_err());
        let cfg = SimulatorConfig::new(1000.0).unwrap();
        assert_eq!(cfg.with_transition_periods(Some(0)), Err(ConfigError::TransitionPeriods));
        assert!(cfg.with_transition_periods(Some(12)).is_ok());
    }
}
