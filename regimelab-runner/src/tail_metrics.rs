//! Tail risk metrics: historical VaR/CVaR at 95% and the median return.
//!
//! Daily portfolio returns are preferred. When a run has none (proxy data,
//! missing fund history), period returns are used instead and the VaR/CVaR
//! are scaled down to a daily approximation by `1/√21`. The result carries
//! a flag so reports can mark the figures as approximate.

use serde::{Deserialize, Serialize};

use crate::metrics::mean_f64;

pub const TRADING_DAYS_PER_YEAR: f64 = 252.0;
pub const TRADING_DAYS_PER_MONTH: f64 = 21.0;
const PERIODS_PER_YEAR: f64 = 12.0;
const TAIL_QUANTILE: f64 = 0.05;

/// Tail statistics in daily terms.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TailRisk {
    /// Return at the 5th percentile (negative = loss).
    pub var_95: f64,
    /// Mean of all returns at or below the VaR index.
    pub cvar_95: f64,
    pub median: f64,
    /// Median compounded 252× (daily) or 12× (period fallback).
    pub annualized_median: f64,
    pub is_approximation: bool,
}

/// Tail risk from daily returns, or from period returns when no daily
/// series is available.
pub fn tail_risk(daily_returns: &[f64], period_returns: &[f64]) -> TailRisk {
    if !daily_returns.is_empty() {
        let sorted = sorted_ascending(daily_returns);
        let (var, cvar) = var_cvar(&sorted);
        let median = median_sorted(&sorted);
        return TailRisk {
            var_95: var,
            cvar_95: cvar,
            median,
            annualized_median: compound(median, TRADING_DAYS_PER_YEAR),
            is_approximation: false,
        };
    }

    if period_returns.is_empty() {
        return TailRisk::default();
    }

    let sorted = sorted_ascending(period_returns);
    let (var, cvar) = var_cvar(&sorted);
    let median = median_sorted(&sorted);
    let scale = TRADING_DAYS_PER_MONTH.sqrt();
    TailRisk {
        var_95: var / scale,
        cvar_95: cvar / scale,
        median,
        annualized_median: compound(median, PERIODS_PER_YEAR),
        is_approximation: true,
    }
}

/// Index of the 5th percentile in a sorted series: `floor(0.05·n)`.
pub fn var_index(n: usize) -> usize {
    (n as f64 * TAIL_QUANTILE).floor() as usize
}

/// Historical VaR and CVaR from an ascending series.
///
/// CVaR averages everything at or below the VaR index, so it never exceeds
/// the VaR.
fn var_cvar(sorted: &[f64]) -> (f64, f64) {
    if sorted.is_empty() {
        return (0.0, 0.0);
    }
    let idx = var_index(sorted.len()).min(sorted.len() - 1);
    (sorted[idx], mean_f64(&sorted[..=idx]))
}

fn median_sorted(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    if n == 0 {
        return 0.0;
    }
    if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    }
}

fn compound(r: f64, times: f64) -> f64 {
    (1.0 + r).powf(times) - 1.0
}

fn sorted_ascending(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hundred_days() -> Vec<f64> {
        // -0.050, -0.049, ..., 0.049
        (0..100).map(|i| (i as f64 - 50.0) / 1000.0).collect()
    }

    #[test]
    fn var_index_floors() {
        assert_eq!(var_index(100), 5);
        assert_eq!(var_index(19), 0);
        assert_eq!(var_index(20), 1);
        assert_eq!(var_index(0), 0);
    }

    #[test]
    fn daily_var_and_cvar() {
        let t = tail_risk(&hundred_days(), &[]);
        assert!(!t.is_approximation);
        assert!((t.var_95 - (-0.045)).abs() < 1e-12);
        // mean of -0.050..=-0.045
        assert!((t.cvar_95 - (-0.0475)).abs() < 1e-12);
        assert!(t.cvar_95 <= t.var_95);
    }

    #[test]
    fn daily_median_and_annualization() {
        let t = tail_risk(&[0.001, 0.002, 0.003], &[]);
        assert!((t.median - 0.002).abs() < 1e-15);
        assert!((t.annualized_median - (1.002f64.powf(252.0) - 1.0)).abs() < 1e-12);

        let even = tail_risk(&[0.004, 0.001, 0.003, 0.002], &[]);
        assert!((even.median - 0.0025).abs() < 1e-15);
    }

    #[test]
    fn period_fallback_is_scaled_and_flagged() {
        let monthly = [-0.08, -0.02, 0.01, 0.03];
        let t = tail_risk(&[], &monthly);
        assert!(t.is_approximation);
        assert!((t.var_95 - (-0.08 / 21f64.sqrt())).abs() < 1e-12);
        assert!((t.cvar_95 - t.var_95).abs() < 1e-12);
        assert!((t.median - (-0.005)).abs() < 1e-12);
        assert!((t.annualized_median - (0.995f64.powf(12.0) - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn empty_is_zero() {
        let t = tail_risk(&[], &[]);
        assert_eq!(t, TailRisk::default());
    }
}
