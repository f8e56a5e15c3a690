//! Criterion benchmarks for RegimeLab hot paths.
//!
//! Benchmarks:
//! 1. Detection pipeline over a monthly indicator series
//! 2. Rebalancer on a multi-fund map
//! 3. Full simulation (detection, rebalancing, drift) with daily fund data

use chrono::NaiveDate;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use regimelab_core::allocation::{bands_for, rebalance, ExpectedReturns};
use regimelab_core::detection::{detect_sequence, DetectorConfig};
use regimelab_core::domain::{AssetClass, FundMap, Indicator, IndicatorSnapshot, Regime};
use regimelab_core::engine::{simulate, FundReturns, MacroPoint, MarketProxies, SimulationInput, SimulatorConfig};

// ── Helpers ──────────────────────────────────────────────────────────

/// Indicators cycling slowly through the regimes.
fn make_snapshots(n: usize) -> Vec<IndicatorSnapshot> {
    (0..n)
        .map(|i| {
            let t = i as f64 * 0.05;
            IndicatorSnapshot::new()
                .with(Indicator::RealRate, 2.0 * t.sin())
                .with(Indicator::DebtStress, 6.0 + 3.0 * (t * 0.7).cos())
                .with(Indicator::BondEquityCorr, 0.6 * (t * 1.3).sin())
                .with(Indicator::CbGoldBuying, 25.0 + 20.0 * t.cos())
                .with(Indicator::InflationVol, 1.5 + (t * 0.9).sin())
                .with(Indicator::VolatilityRatio, 1.2 + 0.6 * (t * 1.1).cos())
        })
        .collect()
}

fn make_fund_map(per_class: usize) -> FundMap {
    AssetClass::ALL
        .iter()
        .flat_map(|&class| (0..per_class).map(move |k| (format!("{}-{k}", class.label()), class)))
        .collect()
}

fn make_expected_returns(fund_map: &FundMap) -> ExpectedReturns {
    fund_map
        .keys()
        .enumerate()
        .map(|(i, f)| (f.clone(), 0.04 + 0.01 * (i % 7) as f64))
        .collect()
}

fn make_points(n: usize) -> Vec<MacroPoint> {
    let start = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
    make_snapshots(n)
        .into_iter()
        .enumerate()
        .map(|(i, s)| {
            let market = MarketProxies {
                equity_index: Some(100.0 * (1.0 + 0.005 * i as f64)),
                gold_price: Some(300.0 + i as f64),
                bond_yield: Some(6.0 + (i as f64 * 0.1).sin()),
            };
            MacroPoint::new(start + chrono::Months::new(i as u32), s).with_market(market)
        })
        .collect()
}

fn make_fund_returns(fund_map: &FundMap, points: &[MacroPoint]) -> FundReturns {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return FundReturns::new();
    };
    let days: Vec<NaiveDate> = first.date.iter_days().take_while(|d| *d <= last.date).collect();
    fund_map
        .keys()
        .enumerate()
        .map(|(k, fund)| {
            let series = days
                .iter()
                .enumerate()
                .map(|(i, d)| (*d, 0.0003 + 0.004 * ((i + k) as f64 * 0.37).sin()))
                .collect();
            (fund.clone(), series)
        })
        .collect()
}

// ── 1. Detection ─────────────────────────────────────────────────────

fn bench_detection(c: &mut Criterion) {
    let mut group = c.benchmark_group("detection");

    for &periods in &[120usize, 600] {
        let snaps = make_snapshots(periods);
        group.bench_with_input(BenchmarkId::new("production", periods), &snaps, |b, snaps| {
            b.iter(|| detect_sequence(black_box(snaps), &DetectorConfig::production()))
        });
        group.bench_with_input(BenchmarkId::new("raw", periods), &snaps, |b, snaps| {
            b.iter(|| detect_sequence(black_box(snaps), &DetectorConfig::raw()))
        });
    }

    group.finish();
}

// ── 2. Rebalancer ────────────────────────────────────────────────────

fn bench_rebalance(c: &mut Criterion) {
    let mut group = c.benchmark_group("rebalance");
    let fund_map = make_fund_map(5);
    let expected = make_expected_returns(&fund_map);

    for regime in Regime::ALL {
        let bands = bands_for(regime);
        group.bench_function(BenchmarkId::new("30_funds", regime.id()), |b| {
            b.iter(|| rebalance(black_box(&fund_map), black_box(&bands), Some(&expected)))
        });
    }

    group.finish();
}

// ── 3. Simulation ────────────────────────────────────────────────────

fn bench_simulation(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulation");
    group.sample_size(20);

    let fund_map = make_fund_map(2);
    let expected = make_expected_returns(&fund_map);
    for &periods in &[60usize, 240] {
        let points = make_points(periods);
        let fund_returns = make_fund_returns(&fund_map, &points);
        let input = SimulationInput {
            points: &points,
            fund_map: &fund_map,
            fund_returns: &fund_returns,
            expected_returns: Some(&expected),
        };
        group.bench_with_input(BenchmarkId::new("monthly_12_funds", periods), &input, |b, input| {
            b.iter(|| simulate(black_box(input), &SimulatorConfig::default()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_detection, bench_rebalance, bench_simulation);
criterion_main!(benches);
