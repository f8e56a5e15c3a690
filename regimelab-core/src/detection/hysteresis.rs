//! Hysteresis lock: one-way stickiness for the stress regime C.
//!
//! Once the dominant regime is C, a different argmax only takes over when
//! the exit test passes on the last three periods of history. The exit
//! test is an OR of three weak conditions, so leaving C is easy relative
//! to entering it.

use serde::{Deserialize, Serialize};

use crate::domain::{Indicator, IndicatorSnapshot, Regime, RegimeProbabilities};

/// Confidence reported whenever a lock or gate holds a regime the raw
/// argmax disagrees with.
pub const STICKY_CONFIDENCE: f64 = 0.7;

/// Periods of history the exit test looks at.
pub const EXIT_WINDOW: usize = 3;

const CONFIDENCE_SCALE: f64 = 2.5;
const MIN_CONFIDENCE: f64 = 0.1;
const MAX_CONFIDENCE: f64 = 1.0;

/// Which exit sub-conditions held over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ExitConditions {
    /// ≥ 2 of 3 periods with realRate > 0.5.
    pub real_rate: bool,
    /// ≥ 1 of 3 periods with bondEquityCorr < −0.1.
    pub correlation: bool,
    /// ≥ 2 of 3 periods with cbGoldBuying < 30.
    pub gold: bool,
}

impl ExitConditions {
    pub fn any(&self) -> bool {
        self.real_rate || self.correlation || self.gold
    }
}

/// Evaluate the exit sub-conditions. `None` with fewer than
/// [`EXIT_WINDOW`] history entries.
pub fn exit_conditions(history: &[IndicatorSnapshot]) -> Option<ExitConditions> {
    if history.len() < EXIT_WINDOW {
        return None;
    }
    let recent = &history[history.len() - EXIT_WINDOW..];

    Some(ExitConditions {
        real_rate: count_where(recent, Indicator::RealRate, |x| x > 0.5) >= 2,
        correlation: count_where(recent, Indicator::BondEquityCorr, |x| x < -0.1) >= 1,
        gold: count_where(recent, Indicator::CbGoldBuying, |x| x < 30.0) >= 2,
    })
}

fn count_where(recent: &[IndicatorSnapshot], indicator: Indicator, pred: impl Fn(f64) -> bool) -> usize {
    recent.iter().filter(|s| pred(s.value(indicator))).count()
}

/// True when the stress lock may release.
pub fn should_exit_stress(history: &[IndicatorSnapshot]) -> bool {
    exit_conditions(history).is_some_and(|c| c.any())
}

/// Result of applying the sticky lock to a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockOutcome {
    pub regime: Regime,
    /// The lock overrode the candidate.
    pub held: bool,
}

/// Keep regime C when it was the previous dominant and the exit test fails.
pub fn apply_sticky_lock(
    previous: Option<Regime>,
    candidate: Regime,
    history: &[IndicatorSnapshot],
) -> LockOutcome {
    let locked = previous == Some(Regime::C) && candidate != Regime::C && !should_exit_stress(history);
    if locked {
        LockOutcome {
            regime: Regime::C,
            held: true,
        }
    } else {
        LockOutcome {
            regime: candidate,
            held: false,
        }
    }
}

/// Unclamped confidence margin: `(P_dominant − P_next) × 2.5`.
pub fn confidence_margin(probabilities: &RegimeProbabilities, dominant: Regime) -> f64 {
    (probabilities.get(dominant) - probabilities.highest_excluding(dominant)) * CONFIDENCE_SCALE
}

/// Confidence in [0.1, 1.0].
pub fn confidence(probabilities: &RegimeProbabilities, dominant: Regime) -> f64 {
    confidence_margin(probabilities, dominant).clamp(MIN_CONFIDENCE, MAX_CONFIDENCE)
}
