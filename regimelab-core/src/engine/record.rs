//! Simulator output types.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::returns::DataSource;
use crate::detection::RegimeDetection;
use crate::domain::{Diagnostic, PortfolioWeights, Regime};

/// Why a period rebalanced. The first matching reason wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RebalanceTrigger {
    Initial,
    RegimeChange,
    Cadence,
    BandBreach,
}

/// One simulated period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestPeriodRecord {
    pub date: NaiveDate,
    pub regime: Regime,
    pub confidence: f64,
    pub is_sticky: bool,
    /// Weights held over the period (post-rebalance, pre-drift).
    pub weights: PortfolioWeights,
    pub period_return: f64,
    pub cumulative_return: f64,
    pub portfolio_value: f64,
    pub rebalanced: bool,
    pub trigger: Option<RebalanceTrigger>,
    /// Progress through a band transition, when one is active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transition_progress: Option<f64>,
    pub data_source: DataSource,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

impl BacktestPeriodRecord {
    pub fn used_proxy(&self) -> bool {
        matches!(self.data_source, DataSource::Proxy | DataSource::Mixed)
    }
}

/// A change of the dominant regime between consecutive periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegimeTransition {
    pub date: NaiveDate,
    pub from: Regime,
    pub to: Regime,
    pub confidence: f64,
}

/// Everything a simulation run produces.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationOutput {
    pub records: Vec<BacktestPeriodRecord>,
    pub detections: Vec<RegimeDetection>,
    /// Flat list of daily portfolio returns from periods with full real data.
    pub daily_returns: Vec<f64>,
    pub transitions: Vec<RegimeTransition>,
    pub initial_investment: f64,
}

impl SimulationOutput {
    pub fn period_returns(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.period_return).collect()
    }

    pub fn portfolio_values(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.portfolio_value).collect()
    }

    pub fn rebalance_count(&self) -> usize {
        self.records.iter().filter(|r| r.rebalanced).count()
    }

    pub fn proxy_periods(&self) -> usize {
        self.records.iter().filter(|r| r.used_proxy()).count()
    }
}
