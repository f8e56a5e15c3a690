//! Comparison of a regime backtest against a benchmark return series.
//!
//! The benchmark is compounded on the same macro dates as the simulation.
//! Dates missing from the benchmark series count as a 0% period.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::BacktestSummary;

/// Benchmark period return keyed by the macro date that starts the period.
pub type BenchmarkReturns = BTreeMap<NaiveDate, f64>;

/// Regime minus benchmark. For drawdown the sign is flipped so a positive
/// number always means the regime portfolio did better.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Outperformance {
    pub total_return: f64,
    pub annualized_return: f64,
    pub sharpe_ratio: f64,
    pub max_drawdown: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BenchmarkComparison {
    pub regime: BacktestSummary,
    pub benchmark: BacktestSummary,
    pub outperformance: Outperformance,
    /// Macro dates with no benchmark observation.
    pub missing_dates: usize,
}

/// Summarize the benchmark over `dates` and diff it against `regime`.
pub fn compare_vs_benchmark(
    regime: &BacktestSummary,
    benchmark: &BenchmarkReturns,
    dates: &[NaiveDate],
    initial_investment: f64,
) -> BenchmarkComparison {
    let mut returns = Vec::with_capacity(dates.len());
    let mut values = Vec::with_capacity(dates.len());
    let mut value = initial_investment;
    let mut missing_dates = 0;

    for date in dates {
        let r = match benchmark.get(date) {
            Some(r) => *r,
            None => {
                missing_dates += 1;
                0.0
            }
        };
        value *= 1.0 + r;
        returns.push(r);
        values.push(value);
    }

    let bench = BacktestSummary::compute(&returns, &values, &[], initial_investment);
    let outperformance = Outperformance {
        total_return: regime.total_return - bench.total_return,
        annualized_return: regime.annualized_return - bench.annualized_return,
        sharpe_ratio: regime.sharpe_ratio - bench.sharpe_ratio,
        max_drawdown: bench.max_drawdown - regime.max_drawdown,
    };

    BenchmarkComparison {
        regime: regime.clone(),
        benchmark: bench,
        outperformance,
        missing_dates,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2021, m, 1).unwrap()
    }

    #[test]
    fn benchmark_compounds_on_macro_dates() {
        let bench: BenchmarkReturns = [(d(1), 0.10), (d(2), -0.05)].into_iter().collect();
        let regime = BacktestSummary {
            total_return: 0.08,
            max_drawdown: 0.02,
            ..Default::default()
        };
        let cmp = compare_vs_benchmark(&regime, &bench, &[d(1), d(2), d(3)], 100_000.0);

        assert_eq!(cmp.missing_dates, 1);
        assert_eq!(cmp.benchmark.periods, 3);
        let expected_total = 1.10 * 0.95 - 1.0;
        assert!((cmp.benchmark.total_return - expected_total).abs() < 1e-12);
        assert!((cmp.benchmark.end_value - 100_000.0 * 1.10 * 0.95).abs() < 1e-6);
        assert!((cmp.outperformance.total_return - (0.08 - expected_total)).abs() < 1e-12);
        // Benchmark fell 5% from its peak; regime only 2%.
        assert!((cmp.outperformance.max_drawdown - 0.03).abs() < 1e-12);
    }

    #[test]
    fn empty_benchmark_is_flat() {
        let cmp = compare_vs_benchmark(&BacktestSummary::default(), &BenchmarkReturns::new(), &[d(1)], 1.0);
        assert_eq!(cmp.benchmark.total_return, 0.0);
        assert_eq!(cmp.benchmark.max_drawdown, 0.0);
        assert_eq!(cmp.missing_dates, 1);
    }
}
