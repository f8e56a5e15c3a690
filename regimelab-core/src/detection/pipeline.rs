//! Detection pipeline: one indicator snapshot plus the previous state in,
//! one [`RegimeDetection`] out.
//!
//! Stage order:
//! 1. score indicators, normalize to a likelihood
//! 2. Bayesian smoothing against the previous probabilities
//! 3. optional decay limiter
//! 4. candidate = argmax (A > B > C > D on ties)
//! 5. optional transition gate
//! 6. optional sticky C lock
//! 7. confidence
//!
//! State is an explicit [`RegimeState`] value threaded by the caller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::hysteresis::{apply_sticky_lock, confidence, confidence_margin, EXIT_WINDOW, STICKY_CONFIDENCE};
use super::likelihood::likelihood;
use super::scorer::{score_indicators, IndicatorScores};
use super::smoother::{smooth, LearningRate};
use super::transition::{limit_decay, should_allow_transition, TransitionConfig, TransitionDecision};
use crate::domain::{ConfigError, Diagnostic, IndicatorSnapshot, Regime, RegimeProbabilities};

/// Rolling window of detections kept in [`RegimeState`].
pub const HISTORY_WINDOW: usize = 24;

/// Which stages run and with what parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub learning_rate: LearningRate,
    pub decay_limiter: bool,
    pub transition_gate: bool,
    pub sticky_lock: bool,
    pub transition: TransitionConfig,
}

impl DetectorConfig {
    /// λ = 0.3 with the sticky C lock.
    pub fn production() -> Self {
        Self {
            learning_rate: LearningRate::PRODUCTION,
            decay_limiter: false,
            transition_gate: false,
            sticky_lock: true,
            transition: TransitionConfig::default(),
        }
    }

    /// No smoothing, no lock: every period is classified on its own.
    pub fn raw() -> Self {
        Self {
            learning_rate: LearningRate::RAW,
            decay_limiter: false,
            transition_gate: false,
            sticky_lock: false,
            transition: TransitionConfig::default(),
        }
    }

    pub fn with_learning_rate(mut self, lambda: f64) -> Result<Self, ConfigError> {
        self.learning_rate = LearningRate::new(lambda)?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        LearningRate::new(self.learning_rate.value())?;
        self.transition.validate()
    }
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self::production()
    }
}

/// One period's classification. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegimeDetection {
    /// Smoothed (and possibly decay-limited) probabilities.
    pub probabilities: RegimeProbabilities,
    /// Normalized snapshot likelihood before smoothing.
    pub raw_likelihood: RegimeProbabilities,
    pub dominant: Regime,
    /// Argmax before the gate and lock.
    pub raw_dominant: Regime,
    pub confidence: f64,
    pub raw_confidence: f64,
    pub is_sticky: bool,
    pub indicators: IndicatorSnapshot,
    pub scores: IndicatorScores,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gate: Option<TransitionDecision>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<Diagnostic>,
}

/// Values carried from one period into the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegimeState {
    pub probabilities: Option<RegimeProbabilities>,
    pub dominant: Option<Regime>,
    /// Previous detections, oldest first, at most [`HISTORY_WINDOW`].
    pub history: Vec<RegimeDetection>,
}

impl RegimeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// State after `detection`, with the history trimmed to the window.
    pub fn advance(mut self, detection: &RegimeDetection) -> Self {
        self.probabilities = Some(detection.probabilities);
        self.dominant = Some(detection.dominant);
        self.history.push(detection.clone());
        if self.history.len() > HISTORY_WINDOW {
            let excess = self.history.len() - HISTORY_WINDOW;
            self.history.drain(..excess);
        }
        self
    }

    fn recent_indicators(&self) -> Vec<IndicatorSnapshot> {
        let start = self.history.len().saturating_sub(EXIT_WINDOW);
        self.history[start..].iter().map(|d| d.indicators.clone()).collect()
    }

    fn dominant_history(&self) -> Vec<Regime> {
        self.history.iter().map(|d| d.dominant).collect()
    }
}

/// Classify one snapshot given the previous state.
pub fn detect_regime(
    snapshot: &IndicatorSnapshot,
    state: &RegimeState,
    config: &DetectorConfig,
) -> RegimeDetection {
    let scored = score_indicators(snapshot);
    let raw_likelihood = likelihood(&scored.raw);

    let mut probabilities = smooth(&raw_likelihood, state.probabilities.as_ref(), config.learning_rate);
    if config.decay_limiter {
        probabilities = limit_decay(state.probabilities.as_ref(), &probabilities, &config.transition);
    }

    let candidate = probabilities.argmax();
    let raw_confidence = confidence_margin(&probabilities, candidate);
    let mut dominant = candidate;

    let mut gate = None;
    if let (true, Some(current)) = (config.transition_gate, state.dominant) {
        let decision = should_allow_transition(
            current,
            candidate,
            &state.dominant_history(),
            confidence(&probabilities, candidate),
            &config.transition,
        );
        if !decision.allowed {
            debug!(%current, %candidate, reason = ?decision.reason, "transition gated");
            dominant = current;
        }
        gate = Some(decision);
    }

    if config.sticky_lock {
        let lock = apply_sticky_lock(state.dominant, dominant, &state.recent_indicators());
        if lock.held {
            debug!(%candidate, "stress lock held regime C");
            dominant = lock.regime;
        }
    }

    let is_sticky = dominant != candidate;
    let confidence = if is_sticky {
        STICKY_CONFIDENCE
    } else {
        confidence(&probabilities, dominant)
    };

    RegimeDetection {
        probabilities,
        raw_likelihood,
        dominant,
        raw_dominant: candidate,
        confidence,
        raw_confidence,
        is_sticky,
        indicators: snapshot.clone(),
        scores: scored.scores,
        gate,
        diagnostics: scored.diagnostics,
    }
}

/// Classify a chronological sequence of snapshots from an empty state.
pub fn detect_sequence(snapshots: &[IndicatorSnapshot], config: &DetectorConfig) -> Vec<RegimeDetection> {
    let mut state = RegimeState::new();
    let mut out = Vec::with_capacity(snapshots.len());
    for snapshot in snapshots {
        let detection = detect_regime(snapshot, &state, config);
        state = state.advance(&detection);
        out.push(detection);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Indicator;

    fn stress() -> IndicatorSnapshot {
        IndicatorSnapshot::new()
            .with(Indicator::RealRate, -2.0)
            .with(Indicator::DebtStress, 10.0)
            .with(Indicator::BondEquityCorr, 0.9)
            .with(Indicator::CbGoldBuying, 2.5)
            .with(Indicator::InflationVol, 4.5)
            .with(Indicator::VolatilityRatio, 2.8)
    }

    /// Strong regime A reading that still fails every exit condition except
    /// via history.
    fn credibility() -> IndicatorSnapshot {
        IndicatorSnapshot::new()
            .with(Indicator::RealRate, 3.0)
            .with(Indicator::DebtStress, 2.0)
            .with(Indicator::BondEquityCorr, -0.6)
            .with(Indicator::CbGoldBuying, 40.0)
            .with(Indicator::InflationVol, 0.5)
            .with(Indicator::VolatilityRatio, 0.6)
            .with(Indicator::TermPremium, 1.5)
    }

    fn c_state() -> RegimeState {
        RegimeState {
            probabilities: Some(RegimeProbabilities::new(0.1, 0.1, 0.7, 0.1)),
            dominant: Some(Regime::C),
            history: Vec::new(),
        }
    }

    #[test]
    fn neutral_snapshot_is_deterministic() {
        let snap = IndicatorSnapshot::new();
        let a = detect_regime(&snap, &RegimeState::new(), &DetectorConfig::production());
        let b = detect_regime(&snap, &RegimeState::new(), &DetectorConfig::production());
        assert_eq!(a.dominant, b.dominant);
        assert_eq!(a.dominant, Regime::B);
        assert!(a.probabilities.is_normalized());
    }

    #[test]
    fn stress_snapshot_is_c_above_half() {
        let d = detect_regime(&stress(), &RegimeState::new(), &DetectorConfig::production());
        assert_eq!(d.dominant, Regime::C);
        assert!(d.probabilities[Regime::C] > 0.5);
        assert!(!d.is_sticky);
    }

    #[test]
    fn first_period_uses_likelihood_directly() {
        let d = detect_regime(&stress(), &RegimeState::new(), &DetectorConfig::production());
        assert_eq!(d.probabilities, d.raw_likelihood);
    }

    #[test]
    fn lock_holds_c_with_short_history() {
        let cfg = DetectorConfig::raw();
        let cfg = DetectorConfig { sticky_lock: true, ..cfg };
        let d = detect_regime(&credibility(), &c_state(), &cfg);
        assert_eq!(d.raw_dominant, Regime::A);
        assert_eq!(d.dominant, Regime::C);
        assert!(d.is_sticky);
        assert_eq!(d.confidence, STICKY_CONFIDENCE);
    }

    #[test]
    fn lock_releases_after_exit_history() {
        let cfg = DetectorConfig {
            sticky_lock: true,
            ..DetectorConfig::raw()
        };
        let mut state = c_state();
        for _ in 0..3 {
            let mut d = detect_regime(&credibility(), &RegimeState::new(), &cfg);
            d.dominant = Regime::C;
            state = state.advance(&d);
        }
        let d = detect_regime(&credibility(), &state, &cfg);
        assert_eq!(d.dominant, Regime::A);
        assert!(!d.is_sticky);
    }

    #[test]
    fn raw_mode_never_sticks() {
        let d = detect_regime(&credibility(), &c_state(), &DetectorConfig::raw());
        assert_eq!(d.dominant, Regime::A);
        assert!(!d.is_sticky);
    }

    #[test]
    fn gate_holds_young_regime() {
        let cfg = DetectorConfig {
            transition_gate: true,
            sticky_lock: false,
            ..DetectorConfig::raw()
        };
        let mut state = RegimeState::new();
        let first = detect_regime(&stress(), &state, &cfg);
        state = state.advance(&first);
        let d = detect_regime(&credibility(), &state, &cfg);
        assert_eq!(d.raw_dominant, Regime::A);
        assert_eq!(d.dominant, Regime::C);
        assert!(d.is_sticky);
        assert!(d.gate.is_some_and(|g| !g.allowed));
    }

    #[test]
    fn history_is_capped() {
        let snaps = vec![IndicatorSnapshot::new(); HISTORY_WINDOW + 10];
        let mut state = RegimeState::new();
        for s in &snaps {
            let d = detect_regime(s, &state, &DetectorConfig::production());
            state = state.advance(&d);
        }
        assert_eq!(state.history.len(), HISTORY_WINDOW);
    }

    #[test]
    fn smoothing_pulls_toward_prior() {
        let cfg = DetectorConfig {
            sticky_lock: false,
            ..DetectorConfig::production()
        };
        let d = detect_regime(&credibility(), &c_state(), &cfg);
        assert!(d.probabilities[Regime::C] > d.raw_likelihood[Regime::C]);
    }

    #[test]
    fn detect_sequence_threads_state() {
        let seq = detect_sequence(&[stress(), credibility()], &DetectorConfig::production());
        assert_eq!(seq.len(), 2);
        assert_eq!(seq[0].dominant, Regime::C);
        // Locked: only one period of history.
        assert_eq!(seq[1].dominant, Regime::C);
    }

    #[test]
    fn invalid_learning_rate_is_rejected() {
        assert!(DetectorConfig::production().with_learning_rate(0.0).is_err());
        assert!(DetectorConfig::production().with_learning_rate(0.5).is_ok());
    }
}
