//! Backtest runner: wires together the dataset, simulator, and metrics.
//!
//! Two entry points:
//! - `run_backtest()`: loads the CSV dataset named in the config, then runs. Used by the CLI.
//! - `run_backtest_from_data()`: takes a pre-loaded dataset. Used by sweeps.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use regimelab_core::allocation::missing_asset_classes;
use regimelab_core::domain::{AssetClass, Regime};
use regimelab_core::engine::{simulate, SimulationError, SimulationInput, SimulationOutput, SimulatorConfig};

use crate::benchmark::{compare_vs_benchmark, BenchmarkComparison};
use crate::config::{BacktestConfig, ConfigError, RunId};
use crate::dataset::{Dataset, LoadError};
use crate::metrics::BacktestSummary;
use crate::regime_stats::{regime_performance, RegimePerformance};

/// Errors from the runner.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("data error: {0}")]
    Data(#[from] LoadError),
    #[error("simulation error: {0}")]
    Simulation(#[from] SimulationError),
    #[error("no macro points in the selected date range")]
    NoData,
}

/// Current schema version for persisted artifacts.
pub const SCHEMA_VERSION: u32 = 1;

/// Inclusive date window applied to the macro series.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

/// Asset classes a regime wants but the fund map cannot supply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageGap {
    pub regime: Regime,
    pub missing: Vec<AssetClass>,
}

/// Complete result of a single backtest run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BacktestResult {
    /// Schema version for forward-compatible deserialization.
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub run_id: RunId,
    pub dataset_hash: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub config: SimulatorConfig,
    pub summary: BacktestSummary,
    pub regime_performance: Vec<RegimePerformance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub benchmark: Option<BenchmarkComparison>,
    pub coverage_gaps: Vec<CoverageGap>,
    pub output: SimulationOutput,
}

/// Default schema version for serde deserialization of older JSON without the field.
fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl BacktestResult {
    pub fn regime_changes(&self) -> usize {
        self.output.transitions.len()
    }

    pub fn final_regime(&self) -> Option<Regime> {
        self.output.records.last().map(|r| r.regime)
    }
}

/// Run a single backtest from a `BacktestConfig` (loads data from disk).
///
/// This is the high-level entry point used by the CLI. For a pre-loaded
/// dataset, use `run_backtest_from_data()` instead.
pub fn run_backtest(config: &BacktestConfig) -> Result<BacktestResult, RunError> {
    let dataset = Dataset::load(&config.data)?;
    let simulator = config.simulator_config()?;
    let window = DateWindow {
        start: config.backtest.start_date,
        end: config.backtest.end_date,
    };
    run_backtest_from_data(&dataset, &simulator, window)
}

/// Run a backtest with a pre-loaded dataset. Does no I/O.
pub fn run_backtest_from_data(
    dataset: &Dataset,
    config: &SimulatorConfig,
    window: DateWindow,
) -> Result<BacktestResult, RunError> {
    let points = dataset.points_between(window.start, window.end);
    if points.is_empty() {
        return Err(RunError::NoData);
    }

    let coverage_gaps: Vec<CoverageGap> = Regime::ALL
        .iter()
        .filter_map(|&regime| {
            let missing = missing_asset_classes(&dataset.fund_map, regime);
            (!missing.is_empty()).then_some(CoverageGap { regime, missing })
        })
        .collect();
    for gap in &coverage_gaps {
        warn!(regime = %gap.regime, missing = ?gap.missing, "fund map does not cover regime bands");
    }

    let input = SimulationInput {
        points,
        fund_map: &dataset.fund_map,
        fund_returns: &dataset.fund_returns,
        expected_returns: dataset.expected_returns.as_ref(),
    };
    let output = simulate(&input, config)?;

    let proxy_periods = output.proxy_periods();
    if proxy_periods > 0 {
        warn!(proxy_periods, periods = output.records.len(), "returns estimated from macro proxies");
    }

    let summary = BacktestSummary::from_output(&output);
    let benchmark = dataset.benchmark.as_ref().map(|b| {
        let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
        compare_vs_benchmark(&summary, b, &dates, config.initial_investment)
    });

    let run_id = run_id(config, &dataset.dataset_hash, window)?;
    info!(
        %run_id,
        periods = summary.periods,
        total_return = summary.total_return,
        sharpe = summary.sharpe_ratio,
        max_drawdown = summary.max_drawdown,
        "backtest complete"
    );

    Ok(BacktestResult {
        schema_version: SCHEMA_VERSION,
        run_id,
        dataset_hash: dataset.dataset_hash.clone(),
        start_date: points.first().map(|p| p.date),
        end_date: points.last().map(|p| p.date),
        config: *config,
        regime_performance: regime_performance(&output.records),
        summary,
        benchmark,
        coverage_gaps,
        output,
    })
}

#[derive(Serialize)]
struct RunKey<'a> {
    config: &'a SimulatorConfig,
    dataset: &'a str,
    window: DateWindow,
}

/// Content hash of everything that determines a run's output.
fn run_id(config: &SimulatorConfig, dataset_hash: &str, window: DateWindow) -> Result<RunId, ConfigError> {
    let key = RunKey {
        config,
        dataset: dataset_hash,
        window,
    };
    let canonical = serde_json::to_value(&key)?.to_string();
    Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use regimelab_core::domain::{FundMap, Indicator, IndicatorSnapshot};
    use regimelab_core::engine::{MacroPoint, MarketProxies};

    fn dataset(n: usize) -> Dataset {
        let points = (0..n)
            .map(|i| {
                let date = NaiveDate::from_ymd_opt(2018, 1, 1).unwrap() + chrono::Months::new(i as u32);
                let snap = IndicatorSnapshot::new()
                    .with(Indicator::RealRate, 2.0)
                    .with(Indicator::DebtStress, 4.0)
                    .with(Indicator::BondEquityCorr, -0.5);
                let market = MarketProxies {
                    equity_index: Some(100.0 + i as f64),
                    gold_price: Some(1300.0),
                    bond_yield: Some(2.5),
                };
                MacroPoint::new(date, snap).with_market(market)
            })
            .collect();
        let fund_map: FundMap = [
            ("EQ".to_string(), AssetClass::Equity),
            ("DS".to_string(), AssetClass::DebtShort),
        ]
        .into_iter()
        .collect();
        Dataset {
            points,
            fund_map,
            dataset_hash: "test".into(),
            ..Default::default()
        }
    }

    #[test]
    fn runs_on_proxy_data() {
        let ds = dataset(12);
        let r = run_backtest_from_data(&ds, &SimulatorConfig::default(), DateWindow::default()).unwrap();
        assert_eq!(r.schema_version, SCHEMA_VERSION);
        assert_eq!(r.summary.periods, 12);
        assert_eq!(r.output.records.len(), 12);
        assert!(r.summary.var_is_approximation);
        assert!(r.benchmark.is_none());
        assert!(!r.coverage_gaps.is_empty());
        assert_eq!(r.start_date, Some(ds.points[0].date));
    }

    #[test]
    fn window_restricts_points() {
        let ds = dataset(24);
        let window = DateWindow {
            start: NaiveDate::from_ymd_opt(2018, 7, 1),
            end: NaiveDate::from_ymd_opt(2018, 12, 1),
        };
        let r = run_backtest_from_data(&ds, &SimulatorConfig::default(), window).unwrap();
        assert_eq!(r.summary.periods, 6);
    }

    #[test]
    fn empty_window_is_an_error() {
        let ds = dataset(3);
        let window = DateWindow {
            start: NaiveDate::from_ymd_opt(2030, 1, 1),
            end: None,
        };
        assert!(matches!(
            run_backtest_from_data(&ds, &SimulatorConfig::default(), window),
            Err(RunError::NoData)
        ));
    }

    #[test]
    fn run_id_depends_on_config_and_data() {
        let ds = dataset(6);
        let a = run_backtest_from_data(&ds, &SimulatorConfig::default(), DateWindow::default()).unwrap();
        let b = run_backtest_from_data(&ds, &SimulatorConfig::default(), DateWindow::default()).unwrap();
        assert_eq!(a.run_id, b.run_id);

        let mut other = ds.clone();
        other.dataset_hash = "other".into();
        let c = run_backtest_from_data(&other, &SimulatorConfig::default(), DateWindow::default()).unwrap();
        assert_ne!(a.run_id, c.run_id);
    }

    #[test]
    fn result_round_trips_through_json() {
        let r = run_backtest_from_data(&dataset(4), &SimulatorConfig::default(), DateWindow::default()).unwrap();
        let json = serde_json::to_string(&r).unwrap();
        let back: BacktestResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back.run_id, r.run_id);
        assert_eq!(back.output.records.len(), r.output.records.len());
    }
}
