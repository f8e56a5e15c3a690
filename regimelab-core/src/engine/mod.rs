//! Backtest simulator: period-by-period regime detection, rebalancing,
//! return realization and weight drift.
//!
//! The loop is strictly sequential: each period depends on the previous
//! period's detection state and drifted weights. Independent runs can be
//! parallelized by the caller.

pub mod config;
pub mod drift;
pub mod inputs;
pub mod record;
pub mod returns;
pub mod simulator;

pub use config::{RebalanceCadence, SimulatorConfig, DEFAULT_INITIAL_INVESTMENT};
pub use drift::drift_weights;
pub use inputs::{FundReturns, MacroPoint, MarketProxies};
pub use record::{BacktestPeriodRecord, RebalanceTrigger, RegimeTransition, SimulationOutput};
pub use returns::{debt_proxy, period_return, proxy_return, DataSource, PeriodReturn};
pub use simulator::{simulate, SimulationError, SimulationInput};
