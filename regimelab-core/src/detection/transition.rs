//! Transition policy: minimum-stay gate and per-period probability decay cap.
//!
//! Neither stage is on the default detection path; [`DetectorConfig`]
//! switches them on.
//!
//! [`DetectorConfig`]: super::pipeline::DetectorConfig

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, Regime, RegimeProbabilities};

/// Process-wide transition constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransitionConfig {
    /// Periods a regime must hold before any transition is considered.
    pub min_transition_periods: u32,
    /// Periods over which allocation bands interpolate after a change.
    pub max_transition_periods: u32,
    /// Confidence needed for a transition 6–9 periods in.
    pub early_confidence: f64,
    /// Confidence needed 9 or more periods in.
    pub normal_confidence: f64,
    /// Boundary between the early and normal windows.
    pub normal_after_periods: u32,
    pub max_decay_per_quarter: f64,
    pub periods_per_quarter: u32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            min_transition_periods: 6,
            max_transition_periods: 12,
            early_confidence: 0.70,
            normal_confidence: 0.60,
            normal_after_periods: 9,
            max_decay_per_quarter: 0.25,
            periods_per_quarter: 3,
        }
    }
}

impl TransitionConfig {
    /// Largest absolute move any regime probability may make in one period.
    pub fn max_decay_per_period(&self) -> f64 {
        self.max_decay_per_quarter / self.periods_per_quarter as f64
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.periods_per_quarter == 0 {
            return Err(ConfigError::Transition("periods_per_quarter must be > 0".into()));
        }
        if !(self.max_decay_per_quarter > 0.0 && self.max_decay_per_quarter <= 1.0) {
            return Err(ConfigError::Transition(format!(
                "max_decay_per_quarter must be in (0, 1], got {}",
                self.max_decay_per_quarter
            )));
        }
        for (name, c) in [
            ("early_confidence", self.early_confidence),
            ("normal_confidence", self.normal_confidence),
        ] {
            if !(0.0..=1.0).contains(&c) {
                return Err(ConfigError::Transition(format!(
                    "{name} must be in [0, 1], got {c}"
                )));
            }
        }
        if self.normal_after_periods < self.min_transition_periods {
            return Err(ConfigError::Transition(
                "normal_after_periods must not precede min_transition_periods".into(),
            ));
        }
        if self.max_transition_periods == 0 {
            return Err(ConfigError::Transition("max_transition_periods must be > 0".into()));
        }
        Ok(())
    }
}

/// Why the gate allowed or denied a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionReason {
    SameRegime,
    CrisisExit,
    MinimumPeriodsNotMet,
    EarlyConfidenceNotMet,
    ConfidenceNotMet,
    CriteriaMet,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TransitionDecision {
    pub allowed: bool,
    pub reason: TransitionReason,
    pub periods_in_regime: u32,
}

/// Count of trailing entries equal to `current`.
pub fn periods_in_regime(current: Regime, history: &[Regime]) -> u32 {
    history.iter().rev().take_while(|&&r| r == current).count() as u32
}

/// Gate a proposed regime change on time-in-regime and confidence.
///
/// `history` is the dominant regime per previous period, oldest first.
/// Leaving the crisis regime D is never delayed.
pub fn should_allow_transition(
    current: Regime,
    proposed: Regime,
    history: &[Regime],
    confidence: f64,
    config: &TransitionConfig,
) -> TransitionDecision {
    let periods = periods_in_regime(current, history);
    let decide = |allowed, reason| TransitionDecision {
        allowed,
        reason,
        periods_in_regime: periods,
    };

    if current == proposed {
        return decide(true, TransitionReason::SameRegime);
    }
    if current == Regime::D {
        return decide(true, TransitionReason::CrisisExit);
    }
    if periods < config.min_transition_periods {
        return decide(false, TransitionReason::MinimumPeriodsNotMet);
    }
    if periods < config.normal_after_periods {
        if confidence < config.early_confidence {
            return decide(false, TransitionReason::EarlyConfidenceNotMet);
        }
    } else if confidence < config.normal_confidence {
        return decide(false, TransitionReason::ConfidenceNotMet);
    }
    decide(true, TransitionReason::CriteriaMet)
}

/// Cap each regime's move from `previous` at
/// [`TransitionConfig::max_decay_per_period`], clamp to [0, 1], renormalize.
pub fn limit_decay(
    previous: Option<&RegimeProbabilities>,
    raw: &RegimeProbabilities,
    config: &TransitionConfig,
) -> RegimeProbabilities {
    let Some(prev) = previous else {
        return *raw;
    };
    let cap = config.max_decay_per_period();
    let mut out = RegimeProbabilities::default();
    for i in 0..4 {
        let diff = (raw.0[i] - prev.0[i]).clamp(-cap, cap);
        out.0[i] = (prev.0[i] + diff).clamp(0.0, 1.0);
    }
    out.normalized()
}
