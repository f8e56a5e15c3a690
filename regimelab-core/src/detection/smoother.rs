//! Bayesian smoother: convex blend of the current likelihood with the prior.

use serde::{Deserialize, Serialize};

use crate::domain::{ConfigError, RegimeProbabilities};

/// Learning rate λ ∈ (0, 1]. λ = 1 disables smoothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct LearningRate(f64);

impl LearningRate {
    pub const PRODUCTION: LearningRate = LearningRate(0.3);
    pub const RAW: LearningRate = LearningRate(1.0);

    pub fn new(value: f64) -> Result<Self, ConfigError> {
        if value.is_finite() && value > 0.0 && value <= 1.0 {
            Ok(Self(value))
        } else {
            Err(ConfigError::LearningRate(value))
        }
    }

    pub fn value(self) -> f64 {
        self.0
    }
}

impl Default for LearningRate {
    fn default() -> Self {
        Self::PRODUCTION
    }
}

impl TryFrom<f64> for LearningRate {
    type Error = ConfigError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LearningRate> for f64 {
    fn from(lr: LearningRate) -> f64 {
        lr.0
    }
}

/// Blend before renormalization: `λ·L + (1 − λ)·prior` per regime.
pub fn blend(
    likelihood: &RegimeProbabilities,
    prior: &RegimeProbabilities,
    lambda: LearningRate,
) -> RegimeProbabilities {
    let l = lambda.value();
    let mut out = RegimeProbabilities::default();
    for i in 0..4 {
        out.0[i] = l * likelihood.0[i] + (1.0 - l) * prior.0[i];
    }
    out
}

/// Smoothed probabilities for this period. No prior returns the likelihood.
pub fn smooth(
    likelihood: &RegimeProbabilities,
    prior: Option<&RegimeProbabilities>,
    lambda: LearningRate,
) -> RegimeProbabilities {
    match prior {
        Some(prior) => blend(likelihood, prior, lambda).normalized(),
        None => *likelihood,
    }
}
