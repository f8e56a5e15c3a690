//! RegimeLab Runner: backtest orchestration, datasets, metrics, sweeps.
//!
//! This crate builds on `regimelab-core` to provide:
//! - TOML backtest configuration with content-addressed run ids
//! - Local CSV dataset adapter (macro series, fund map, fund returns, benchmark)
//! - Single-backtest runner with summary, per-regime and benchmark statistics
//! - Performance metrics and tail risk (VaR/CVaR with monthly fallback)
//! - Parallel parameter sweeps over learning rate and cadence
//! - Historical sanity catalogue for the regime detector
//! - Multi-period stress suite with the decay limiter and transition gate on

pub mod benchmark;
pub mod config;
pub mod dataset;
pub mod metrics;
pub mod regime_stats;
pub mod runner;
pub mod sanity;
pub mod stress;
pub mod sweep;
pub mod tail_metrics;

pub use benchmark::{compare_vs_benchmark, BenchmarkComparison, BenchmarkReturns, Outperformance};
pub use config::{BacktestConfig, ConfigError, RunId};
pub use dataset::{Dataset, LoadError};
pub use metrics::BacktestSummary;
pub use regime_stats::{regime_performance, RegimePerformance};
pub use runner::{run_backtest, run_backtest_from_data, BacktestResult, DateWindow, RunError, SCHEMA_VERSION};
pub use sanity::{run_sanity_checks, SanityOutcome, SanityReport, SCENARIOS};
pub use stress::{run_stress_tests, stress_detector, StressOutcome, StressReport};
pub use sweep::{best_by_sharpe, run_sweep, SweepGrid, SweepPoint};
pub use tail_metrics::{tail_risk, TailRisk};
