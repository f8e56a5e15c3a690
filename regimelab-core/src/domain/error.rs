use thiserror::Error;

use super::asset_class::AssetClass;

/// A configuration rejected at construction time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("learning rate must be in (0, 1], got {0}")]
    LearningRate(f64),
    #[error("invalid band: expected 0 <= min ({min}) <= target ({target}) <= max ({max}) <= 1")]
    Band { min: f64, target: f64, max: f64 },
    #[error("invalid band for {class}: {reason}")]
    BandFor { class: AssetClass, reason: String },
    #[error("initial investment must be positive and finite, got {0}")]
    InitialInvestment(f64),
    #[error("transition periods must be at least 1")]
    TransitionPeriods,
    #[error("invalid transition config: {0}")]
    Transition(String),
}
