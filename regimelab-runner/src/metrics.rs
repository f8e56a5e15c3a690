//! Performance metrics: pure functions that summarize a simulation.
//!
//! Every metric is a pure function: period returns, portfolio values and/or
//! daily returns in, scalar out. Degenerate input (empty series, zero
//! variance) yields 0.0 rather than NaN.

use serde::{Deserialize, Serialize};

use regimelab_core::engine::SimulationOutput;

use crate::tail_metrics::{tail_risk, TailRisk};

/// Simulation periods per year (monthly macro points).
pub const PERIODS_PER_YEAR: f64 = 12.0;

/// Aggregate statistics for one backtest run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacktestSummary {
    pub periods: usize,
    pub total_return: f64,
    pub annualized_return: f64,
    pub annualized_vol: f64,
    pub sharpe_ratio: f64,
    /// Largest peak-to-trough loss as a positive fraction.
    pub max_drawdown: f64,
    pub win_rate: f64,
    pub daily_var_95: f64,
    pub daily_cvar_95: f64,
    /// VaR/CVaR were scaled down from period returns.
    pub var_is_approximation: bool,
    pub median_return: f64,
    pub annualized_median_return: f64,
    pub end_value: f64,
}

impl BacktestSummary {
    /// Compute all statistics from raw series.
    ///
    /// `portfolio_values` are end-of-period values; the drawdown peak starts
    /// at `initial_investment`. `daily_returns` may be empty, in which case
    /// tail risk falls back to period returns.
    pub fn compute(
        period_returns: &[f64],
        portfolio_values: &[f64],
        daily_returns: &[f64],
        initial_investment: f64,
    ) -> Self {
        let total = total_return(period_returns);
        let annualized = annualized_return(total, period_returns.len());
        let vol = annualized_vol(period_returns);
        let TailRisk {
            var_95,
            cvar_95,
            median,
            annualized_median,
            is_approximation,
        } = tail_risk(daily_returns, period_returns);

        Self {
            periods: period_returns.len(),
            total_return: total,
            annualized_return: annualized,
            annualized_vol: vol,
            sharpe_ratio: sharpe_ratio(annualized, vol),
            max_drawdown: max_drawdown(portfolio_values, initial_investment),
            win_rate: win_rate(period_returns),
            daily_var_95: var_95,
            daily_cvar_95: cvar_95,
            var_is_approximation: is_approximation,
            median_return: median,
            annualized_median_return: annualized_median,
            end_value: portfolio_values.last().copied().unwrap_or(initial_investment),
        }
    }

    /// Summary of a finished simulation.
    pub fn from_output(output: &SimulationOutput) -> Self {
        Self::compute(
            &output.period_returns(),
            &output.portfolio_values(),
            &output.daily_returns,
            output.initial_investment,
        )
    }
}

// ─── Individual metric functions ────────────────────────────────────

/// Compounded return over all periods.
pub fn total_return(period_returns: &[f64]) -> f64 {
    period_returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0
}

/// `(1 + total)^(1/years) − 1` with `years = periods / 12`.
///
/// A wiped-out portfolio annualizes to −1.
pub fn annualized_return(total_return: f64, periods: usize) -> f64 {
    if periods == 0 {
        return 0.0;
    }
    let growth = 1.0 + total_return;
    if growth <= 0.0 {
        return -1.0;
    }
    let years = periods as f64 / PERIODS_PER_YEAR;
    growth.powf(1.0 / years) - 1.0
}

/// Sample standard deviation of period returns scaled by √12.
pub fn annualized_vol(period_returns: &[f64]) -> f64 {
    sample_std_dev(period_returns) * PERIODS_PER_YEAR.sqrt()
}

/// Annualized return over annualized volatility, 0% risk-free.
///
/// Returns 0.0 when volatility is zero.
pub fn sharpe_ratio(annualized_return: f64, annualized_vol: f64) -> f64 {
    if annualized_vol < 1e-15 {
        return 0.0;
    }
    annualized_return / annualized_vol
}

/// Maximum drawdown as a positive fraction (0.15 = 15% below peak).
///
/// The running peak starts at `initial_investment`, so a loss in the very
/// first period counts.
pub fn max_drawdown(portfolio_values: &[f64], initial_investment: f64) -> f64 {
    let mut peak = initial_investment;
    let mut max_dd = 0.0_f64;

    for &value in portfolio_values {
        if value > peak {
            peak = value;
        }
        if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

/// Fraction of periods with a strictly positive return.
pub fn win_rate(period_returns: &[f64]) -> f64 {
    if period_returns.is_empty() {
        return 0.0;
    }
    let winners = period_returns.iter().filter(|&&r| r > 0.0).count();
    winners as f64 / period_returns.len() as f64
}

// ─── Helpers ────────────────────────────────────────────────────────

pub fn mean_f64(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Sample standard deviation (n − 1 denominator). 0.0 below two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = mean_f64(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    var.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn total_return_compounds() {
        let r = total_return(&[0.10, -0.10]);
        assert!((r - (-0.01)).abs() < 1e-12);
        assert_eq!(total_return(&[]), 0.0);
    }

    #[test]
    fn annualized_return_twelve_periods_is_total() {
        assert!((annualized_return(0.12, 12) - 0.12).abs() < 1e-12);
        let two_years = annualized_return(0.21, 24);
        assert!((two_years - 0.10).abs() < 1e-12);
    }

    #[test]
    fn annualized_return_degenerate() {
        assert_eq!(annualized_return(0.5, 0), 0.0);
        assert_eq!(annualized_return(-1.0, 12), -1.0);
        assert_eq!(annualized_return(-1.5, 12), -1.0);
    }

    #[test]
    fn annualized_vol_uses_sample_variance() {
        // mean 0.02, deviations ±0.01 → sample var = 2e-4 / 1
        let vol = annualized_vol(&[0.01, 0.03]);
        assert!((vol - (2e-4_f64).sqrt() * 12f64.sqrt()).abs() < 1e-12);
        assert_eq!(annualized_vol(&[0.05]), 0.0);
    }

    #[test]
    fn sharpe_zero_when_vol_zero() {
        assert_eq!(sharpe_ratio(0.1, 0.0), 0.0);
        assert!((sharpe_ratio(0.1, 0.2) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_peak_to_trough() {
        let dd = max_drawdown(&[100_000.0, 110_000.0, 90_000.0, 95_000.0], 100_000.0);
        assert!((dd - 20_000.0 / 110_000.0).abs() < 1e-10);
        assert!((dd - 0.1818).abs() < 1e-4);
    }

    #[test]
    fn max_drawdown_counts_first_period_loss() {
        let dd = max_drawdown(&[90_000.0, 95_000.0], 100_000.0);
        assert!((dd - 0.10).abs() < 1e-12);
    }

    #[test]
    fn max_drawdown_monotonic_is_zero() {
        assert_eq!(max_drawdown(&[101.0, 102.0, 103.0], 100.0), 0.0);
        assert_eq!(max_drawdown(&[], 100.0), 0.0);
    }

    #[test]
    fn win_rate_counts_strictly_positive() {
        assert!((win_rate(&[0.01, 0.0, -0.01, 0.02]) - 0.5).abs() < 1e-12);
        assert_eq!(win_rate(&[]), 0.0);
    }

    #[test]
    fn summary_end_value_defaults_to_initial() {
        let s = BacktestSummary::compute(&[], &[], &[], 50_000.0);
        assert_eq!(s.end_value, 50_000.0);
        assert_eq!(s.periods, 0);
        assert_eq!(s.sharpe_ratio, 0.0);
    }

    #[test]
    fn summary_from_monthly_series() {
        let returns = [0.10, 90.0 / 110.0 - 1.0, 95.0 / 90.0 - 1.0];
        let values = [110_000.0, 90_000.0, 95_000.0];
        let s = BacktestSummary::compute(&returns, &values, &[], 100_000.0);
        assert_eq!(s.periods, 3);
        assert!((s.total_return - (-0.05)).abs() < 1e-9);
        assert!((s.max_drawdown - 20_000.0 / 110_000.0).abs() < 1e-10);
        assert!(s.var_is_approximation);
        assert_eq!(s.end_value, 95_000.0);
    }
}
