//! Parameter sweeps over learning rate and rebalance cadence.
//!
//! Every grid point is an independent simulation over the same dataset, so
//! the grid runs on the rayon pool. Results keep grid order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use regimelab_core::engine::{RebalanceCadence, SimulatorConfig};

use crate::dataset::Dataset;
use crate::metrics::BacktestSummary;
use crate::runner::{run_backtest_from_data, DateWindow, RunError};

/// Grid of detector/rebalancer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepGrid {
    pub learning_rates: Vec<f64>,
    pub cadences: Vec<RebalanceCadence>,
}

impl Default for SweepGrid {
    /// λ from very sticky to raw, across all cadences.
    fn default() -> Self {
        Self {
            learning_rates: vec![0.1, 0.2, 0.3, 0.5, 1.0],
            cadences: vec![
                RebalanceCadence::EveryPeriod,
                RebalanceCadence::Quarterly,
                RebalanceCadence::Annual,
                RebalanceCadence::SignalOnly,
            ],
        }
    }
}

impl SweepGrid {
    /// Returns the total number of configurations in this grid.
    pub fn size(&self) -> usize {
        self.learning_rates.len() * self.cadences.len()
    }

    /// One config per grid point, derived from `base`. Invalid learning
    /// rates fail here rather than inside the pool.
    pub fn generate_configs(&self, base: &SimulatorConfig) -> Result<Vec<SimulatorConfig>, RunError> {
        let mut configs = Vec::with_capacity(self.size());
        for &lambda in &self.learning_rates {
            let detector = base
                .detector
                .with_learning_rate(lambda)
                .map_err(crate::config::ConfigError::from)?;
            for &cadence in &self.cadences {
                let config = base
                    .with_detector(detector)
                    .map_err(crate::config::ConfigError::from)?
                    .with_cadence(cadence);
                configs.push(config);
            }
        }
        Ok(configs)
    }
}

/// Outcome of one grid point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub learning_rate: f64,
    pub cadence: RebalanceCadence,
    pub run_id: String,
    pub summary: BacktestSummary,
    pub regime_changes: usize,
    pub rebalances: usize,
}

/// Run every grid point in parallel.
pub fn run_sweep(
    dataset: &Dataset,
    base: &SimulatorConfig,
    grid: &SweepGrid,
    window: DateWindow,
) -> Result<Vec<SweepPoint>, RunError> {
    let configs = grid.generate_configs(base)?;
    tracing::info!(points = configs.len(), "starting sweep");

    configs
        .par_iter()
        .map(|config| {
            let result = run_backtest_from_data(dataset, config, window)?;
            Ok(SweepPoint {
                learning_rate: config.detector.learning_rate.value(),
                cadence: config.cadence,
                run_id: result.run_id.clone(),
                regime_changes: result.regime_changes(),
                rebalances: result.output.rebalance_count(),
                summary: result.summary,
            })
        })
        .collect()
}

/// Index of the point with the highest Sharpe ratio.
pub fn best_by_sharpe(points: &[SweepPoint]) -> Option<usize> {
    points
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| {
            a.summary
                .sharpe_ratio
                .partial_cmp(&b.summary.sharpe_ratio)
                .unwrap_or(std::cmp::Ordering::Equal)
        })
        .map(|(i, _)| i)
}
