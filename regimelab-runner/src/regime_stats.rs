//! Per-regime performance breakdown.

use serde::{Deserialize, Serialize};

use regimelab_core::domain::Regime;
use regimelab_core::engine::BacktestPeriodRecord;

use crate::metrics::{mean_f64, total_return, PERIODS_PER_YEAR};

/// How the portfolio did while a regime was dominant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimePerformance {
    pub regime: Regime,
    pub periods: usize,
    /// Fraction of all simulated periods.
    pub share: f64,
    pub avg_period_return: f64,
    /// `(1 + avg)^12 − 1`.
    pub annualized_return: f64,
    /// Compounded return of the regime's periods only.
    pub total_return: f64,
}

/// One entry per regime that was dominant at least once, in A–D order.
pub fn regime_performance(records: &[BacktestPeriodRecord]) -> Vec<RegimePerformance> {
    let total = records.len();
    Regime::ALL
        .iter()
        .filter_map(|&regime| {
            let returns: Vec<f64> = records
                .iter()
                .filter(|r| r.regime == regime)
                .map(|r| r.period_return)
                .collect();
            if returns.is_empty() {
                return None;
            }
            let avg = mean_f64(&returns);
            Some(RegimePerformance {
                regime,
                periods: returns.len(),
                share: returns.len() as f64 / total as f64,
                avg_period_return: avg,
                annualized_return: (1.0 + avg).powf(PERIODS_PER_YEAR) - 1.0,
                total_return: total_return(&returns),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use regimelab_core::engine::DataSource;

    fn record(regime: Regime, r: f64) -> BacktestPeriodRecord {
        BacktestPeriodRecord {
            date: NaiveDate::from_ymd_opt(2020, 1, 1).unwrap(),
            regime,
            confidence: 0.5,
            is_sticky: false,
            weights: Default::default(),
            period_return: r,
            cumulative_return: 0.0,
            portfolio_value: 0.0,
            rebalanced: false,
            trigger: None,
            transition_progress: None,
            data_source: DataSource::Proxy,
            diagnostics: Vec::new(),
        }
    }

    #[test]
    fn groups_by_regime_in_order() {
        let records = vec![
            record(Regime::C, 0.02),
            record(Regime::A, 0.01),
            record(Regime::C, -0.01),
            record(Regime::A, 0.03),
        ];
        let perf = regime_performance(&records);
        assert_eq!(perf.len(), 2);
        assert_eq!(perf[0].regime, Regime::A);
        assert_eq!(perf[1].regime, Regime::C);

        let a = &perf[0];
        assert_eq!(a.periods, 2);
        assert!((a.share - 0.5).abs() < 1e-12);
        assert!((a.avg_period_return - 0.02).abs() < 1e-12);
        assert!((a.annualized_return - (1.02f64.powi(12) - 1.0)).abs() < 1e-12);
        assert!((a.total_return - (1.01 * 1.03 - 1.0)).abs() < 1e-12);
    }

    #[test]
    fn empty_records_give_nothing() {
        assert!(regime_performance(&[]).is_empty());
    }
}
