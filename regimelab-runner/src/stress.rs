//! Stress suite.
//!
//! Multi-period macro paths that push the detector and the allocator through
//! adverse sequences: a gold drawdown inside a repression regime, a fall in
//! inflation while rates stay capped, a strong equity/bond rally and a
//! one-period crisis spike. Every path runs with the decay limiter and the
//! transition gate switched on.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use regimelab_core::allocation::{asset_class_weights, bands_for, rebalance, ExpectedReturns, BAND_TOLERANCE};
use regimelab_core::detection::{detect_regime, detect_sequence, DetectorConfig, RegimeDetection, RegimeState};
use regimelab_core::domain::{AssetClass, FundMap, Indicator, IndicatorSnapshot, Regime};

/// Lowest smoothed P(C) accepted at the end of the inflation-fall path.
pub const INFLATION_FALL_MIN_C: f64 = 0.40;

/// Largest per-period change in any class weight during the rally path.
pub const RALLY_MAX_WEIGHT_SHIFT: f64 = 0.10;

/// Periods the detector may stay in D after the crisis spike.
pub const CRISIS_MAX_RECOVERY: usize = 3;

const GOLD_DRAWDOWN_PERIODS: usize = 18;
const GOLD_EXPECTED_RETURN: f64 = -0.15;
const OTHER_EXPECTED_RETURN: f64 = 0.08;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressOutcome {
    pub scenario: String,
    /// Dominant regime per period.
    pub regimes: Vec<Regime>,
    pub metric: f64,
    pub threshold: f64,
    pub passed: bool,
    pub details: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StressReport {
    pub outcomes: Vec<StressOutcome>,
    pub passed: usize,
    pub total: usize,
}

impl StressReport {
    pub fn all_passed(&self) -> bool {
        self.passed == self.total
    }
}

/// Production smoothing plus the decay limiter and the transition gate.
pub fn stress_detector() -> DetectorConfig {
    DetectorConfig {
        decay_limiter: true,
        transition_gate: true,
        ..DetectorConfig::production()
    }
}

/// Run every stress path.
pub fn run_stress_tests() -> StressReport {
    let config = stress_detector();
    let outcomes = vec![
        gold_underperformance(&config),
        inflation_fall(&config),
        equity_bond_rally(&config),
        crisis_spike(&config),
    ];

    let passed = outcomes.iter().filter(|o| o.passed).count();
    for o in outcomes.iter().filter(|o| !o.passed) {
        tracing::warn!(scenario = %o.scenario, metric = o.metric, threshold = o.threshold, "stress test failed");
    }
    StressReport {
        total: outcomes.len(),
        passed,
        outcomes,
    }
}

/// Gold expected to lose 15% a year while the macro picture stays in C.
/// The gold weight must never drop below the dominant regime's band minimum.
pub fn gold_underperformance(config: &DetectorConfig) -> StressOutcome {
    let detections = detect_sequence(&vec![repression(); GOLD_DRAWDOWN_PERIODS], config);
    let funds = stress_fund_map();
    let expected: ExpectedReturns = funds
        .iter()
        .map(|(fund, class)| {
            let er = if *class == AssetClass::Gold { GOLD_EXPECTED_RETURN } else { OTHER_EXPECTED_RETURN };
            (fund.clone(), er)
        })
        .collect();

    let mut min_gold = f64::INFINITY;
    let mut floor = f64::INFINITY;
    let mut breaches = 0;
    for d in &detections {
        let gold_min = bands_for(d.dominant)[&AssetClass::Gold].min;
        let gold = class_weights(d.dominant, &funds, Some(&expected))
            .get(&AssetClass::Gold)
            .copied()
            .unwrap_or(0.0);
        if gold < gold_min - BAND_TOLERANCE {
            breaches += 1;
        }
        min_gold = min_gold.min(gold);
        floor = floor.min(gold_min);
    }

    StressOutcome {
        scenario: "Gold underperformance".to_string(),
        regimes: dominants(&detections),
        metric: min_gold,
        threshold: floor,
        passed: breaches == 0,
        details: format!("min gold weight {min_gold:.3}, {breaches} period(s) below band minimum"),
    }
}

/// Inflation volatility unwinds while real rates stay capped at 0.5%.
/// Repression persists, so C must hold throughout.
pub fn inflation_fall(config: &DetectorConfig) -> StressOutcome {
    let detections = detect_sequence(&inflation_fall_path(), config);
    let regimes = dominants(&detections);
    let final_c = detections.last().map_or(0.0, |d| d.probabilities.get(Regime::C));
    let held = regimes.iter().all(|&r| r == Regime::C);

    StressOutcome {
        scenario: "Inflation fall with capped rates".to_string(),
        passed: held && final_c >= INFLATION_FALL_MIN_C,
        details: format!("final P(C) {final_c:.3}, C held every period: {held}"),
        regimes,
        metric: final_c,
        threshold: INFLATION_FALL_MIN_C,
    }
}

/// Real rates and term premium climb while stocks and bonds rally together.
/// Class weights must not whipsaw between periods.
pub fn equity_bond_rally(config: &DetectorConfig) -> StressOutcome {
    let detections = detect_sequence(&rally_path(), config);
    let funds = stress_fund_map();
    let weights: Vec<BTreeMap<AssetClass, f64>> =
        detections.iter().map(|d| class_weights(d.dominant, &funds, None)).collect();

    let max_shift = weights
        .windows(2)
        .flat_map(|pair| {
            AssetClass::ALL.iter().map(move |c| {
                let before = pair[0].get(c).copied().unwrap_or(0.0);
                let after = pair[1].get(c).copied().unwrap_or(0.0);
                (after - before).abs()
            })
        })
        .fold(0.0, f64::max);
    let gated = detections.iter().filter(|d| d.raw_dominant != d.dominant).count();

    StressOutcome {
        scenario: "Equity/bond rally".to_string(),
        regimes: dominants(&detections),
        metric: max_shift,
        threshold: RALLY_MAX_WEIGHT_SHIFT,
        passed: max_shift <= RALLY_MAX_WEIGHT_SHIFT,
        details: format!("max class weight shift {max_shift:.3}, {gated} candidate change(s) held"),
    }
}

/// Six calm periods, one crisis period forced to D by an external overlay,
/// then a recovery. The detector must leave D within three periods.
pub fn crisis_spike(config: &DetectorConfig) -> StressOutcome {
    let mut state = RegimeState::new();
    let mut detections = Vec::new();

    for snapshot in std::iter::repeat(disinflationary_growth()).take(6) {
        let d = detect_regime(&snapshot, &state, config);
        state = state.advance(&d);
        detections.push(d);
    }

    let mut spike = detect_regime(&crisis(), &state, config);
    spike.dominant = Regime::D;
    state = state.advance(&spike);
    detections.push(spike);

    let recovery = recovery_path();
    let mut left_after = None;
    for (i, snapshot) in recovery.iter().enumerate() {
        let d = detect_regime(snapshot, &state, config);
        if left_after.is_none() && d.dominant != Regime::D {
            left_after = Some(i + 1);
        }
        state = state.advance(&d);
        detections.push(d);
    }

    let periods = left_after.unwrap_or(recovery.len() + 1);
    StressOutcome {
        scenario: "Crisis spike and recovery".to_string(),
        regimes: dominants(&detections),
        metric: periods as f64,
        threshold: CRISIS_MAX_RECOVERY as f64,
        passed: left_after.is_some_and(|n| n <= CRISIS_MAX_RECOVERY),
        details: match left_after {
            Some(n) => format!("left D after {n} recovery period(s)"),
            None => "still in D at the end of the recovery".to_string(),
        },
    }
}

// ── Paths ────────────────────────────────────────────────────────────

use Indicator::*;

fn repression() -> IndicatorSnapshot {
    IndicatorSnapshot::new()
        .with(RealRate, -1.0)
        .with(DebtStress, 9.0)
        .with(BondEquityCorr, 0.6)
        .with(CbGoldBuying, 2.5)
        .with(InflationVol, 4.5)
        .with(VolatilityRatio, 2.8)
        .with(Volatility, 1.0)
        .with(CreditSpread, 1.0)
}

fn inflation_fall_path() -> Vec<IndicatorSnapshot> {
    (0..12)
        .map(|i| {
            let i = i as f64;
            IndicatorSnapshot::new()
                .with(RealRate, (-1.5 + 0.15 * i).min(0.5))
                .with(DebtStress, 8.0)
                .with(BondEquityCorr, 0.3)
                .with(CbGoldBuying, 60.0)
                .with(InflationVol, (4.5 - 0.25 * i).max(1.5))
                .with(VolatilityRatio, 2.5 - 0.1 * i)
                .with(Volatility, 0.5)
                .with(CreditSpread, 0.5)
        })
        .collect()
}

fn rally_path() -> Vec<IndicatorSnapshot> {
    (0..12)
        .map(|i| {
            let i = i as f64;
            IndicatorSnapshot::new()
                .with(RealRate, 0.5 + 0.3 * i)
                .with(DebtStress, 5.0 - 0.2 * i)
                .with(BondEquityCorr, -0.2 - 0.05 * i)
                .with(InflationMomentum, -0.5)
                .with(GrowthMomentum, -0.3)
                .with(TermPremium, 0.5 + 0.2 * i)
                .with(InflationVol, 0.8)
                .with(VolatilityRatio, 0.9)
                .with(Volatility, -0.5)
                .with(CreditSpread, -0.5)
                .with(CbGoldBuying, 20.0)
        })
        .collect()
}

fn disinflationary_growth() -> IndicatorSnapshot {
    IndicatorSnapshot::new()
        .with(RealRate, 2.5)
        .with(DebtStress, 6.0)
        .with(BondEquityCorr, -0.4)
        .with(InflationMomentum, -0.8)
        .with(GrowthMomentum, -0.5)
        .with(InflationVol, 0.5)
        .with(VolatilityRatio, 0.8)
        .with(Volatility, -0.5)
        .with(CreditSpread, -0.5)
}

fn crisis() -> IndicatorSnapshot {
    IndicatorSnapshot::new()
        .with(RealRate, 0.5)
        .with(DebtStress, 4.5)
        .with(BondEquityCorr, 0.9)
        .with(CbGoldBuying, 0.0)
        .with(InflationVol, 1.0)
        .with(VolatilityRatio, 1.0)
        .with(Volatility, 4.5)
        .with(CreditSpread, 4.0)
}

fn recovery_path() -> Vec<IndicatorSnapshot> {
    (0..6)
        .map(|i| {
            let i = i as f64;
            IndicatorSnapshot::new()
                .with(RealRate, 1.5 + 0.2 * i)
                .with(DebtStress, 5.0)
                .with(BondEquityCorr, -0.1 - 0.1 * i)
                .with(InflationMomentum, -0.5)
                .with(GrowthMomentum, -0.3)
                .with(InflationVol, 0.8)
                .with(VolatilityRatio, 0.9)
                .with(Volatility, 0.5 - 0.3 * i)
                .with(CreditSpread, 0.5 - 0.3 * i)
        })
        .collect()
}

// ── Helpers ──────────────────────────────────────────────────────────

/// One fund per asset class, named after the class.
fn stress_fund_map() -> FundMap {
    AssetClass::ALL.iter().map(|&c| (c.label().to_string(), c)).collect()
}

fn class_weights(regime: Regime, funds: &FundMap, expected: Option<&ExpectedReturns>) -> BTreeMap<AssetClass, f64> {
    let outcome = rebalance(funds, &bands_for(regime), expected);
    asset_class_weights(&outcome.weights, funds)
}

fn dominants(detections: &[RegimeDetection]) -> Vec<Regime> {
    detections.iter().map(|d| d.dominant).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suite_passes_with_gate_and_limiter() {
        let report = run_stress_tests();
        assert_eq!(report.total, 4);
        for o in &report.outcomes {
            assert!(o.passed, "{}: {} (metric {} vs {})", o.scenario, o.details, o.metric, o.threshold);
        }
        assert!(report.all_passed());
    }

    #[test]
    fn stress_detector_enables_both_guards() {
        let c = stress_detector();
        assert!(c.decay_limiter);
        assert!(c.transition_gate);
        assert!(c.sticky_lock);
        assert_eq!(c.learning_rate, DetectorConfig::production().learning_rate);
    }

    #[test]
    fn gold_tilt_is_clamped_at_the_c_floor() {
        let o = gold_underperformance(&stress_detector());
        assert_eq!(o.regimes.len(), GOLD_DRAWDOWN_PERIODS);
        assert!(o.regimes.iter().all(|&r| r == Regime::C));
        // Negative expected return pushes gold to its C minimum and no lower.
        assert!((o.metric - 0.05).abs() < 1e-9, "min gold {}", o.metric);
        assert!((o.threshold - 0.05).abs() < 1e-12);
    }

    #[test]
    fn gold_sits_at_target_without_a_tilt() {
        let w = class_weights(Regime::C, &stress_fund_map(), None);
        assert!((w[&AssetClass::Gold] - 0.10).abs() < 1e-9);
        assert_eq!(w.get(&AssetClass::DebtLong).copied().unwrap_or(0.0), 0.0);
    }

    #[test]
    fn inflation_fall_keeps_c_probability_above_floor() {
        let o = inflation_fall(&stress_detector());
        assert_eq!(o.regimes, vec![Regime::C; 12]);
        assert!(o.metric > 0.44 && o.metric < 0.46, "final P(C) {}", o.metric);
    }

    #[test]
    fn rally_candidate_change_is_held_by_the_gate() {
        let detections = detect_sequence(&rally_path(), &stress_detector());
        assert!(detections.iter().all(|d| d.dominant == Regime::B));
        let last = &detections[11];
        assert_eq!(last.raw_dominant, Regime::A);
        assert!(last.gate.as_ref().is_some_and(|g| !g.allowed));

        let o = equity_bond_rally(&stress_detector());
        assert_eq!(o.metric, 0.0);
        assert!(o.details.contains("2 candidate change(s) held"), "{}", o.details);
    }

    #[test]
    fn crisis_overlay_exits_on_first_recovery_period() {
        let o = crisis_spike(&stress_detector());
        assert_eq!(o.regimes.len(), 13);
        assert!(o.regimes[..6].iter().all(|&r| r == Regime::B));
        assert_eq!(o.regimes[6], Regime::D);
        assert_eq!(o.regimes[7], Regime::B);
        assert_eq!(o.metric, 1.0);
    }

    #[test]
    fn report_round_trips_through_json() {
        let report = run_stress_tests();
        let json = serde_json::to_string(&report).unwrap();
        let back: StressReport = serde_json::from_str(&json).unwrap();
        assert_eq!(back.total, report.total);
        for (a, b) in back.outcomes.iter().zip(&report.outcomes) {
            assert_eq!(a.scenario, b.scenario);
            assert_eq!(a.regimes, b.regimes);
            assert_eq!(a.passed, b.passed);
        }
    }
}
