//! Regime detection: scorer → likelihood → smoother → hysteresis lock.

pub mod hysteresis;
pub mod likelihood;
pub mod pipeline;
pub mod scorer;
pub mod smoother;
pub mod transition;

pub use hysteresis::{apply_sticky_lock, confidence, should_exit_stress, ExitConditions, STICKY_CONFIDENCE};
pub use likelihood::likelihood;
pub use pipeline::{detect_regime, detect_sequence, DetectorConfig, RegimeDetection, RegimeState, HISTORY_WINDOW};
pub use scorer::{score_indicators, IndicatorScores, RawRegimeScores, SIGMOID_TABLE};
pub use smoother::{smooth, LearningRate};
pub use transition::{limit_decay, should_allow_transition, TransitionConfig, TransitionDecision, TransitionReason};
