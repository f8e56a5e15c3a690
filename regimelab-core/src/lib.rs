//! RegimeLab Core: regime detection, allocation bands, backtest simulator.
//!
//! This crate is pure and synchronous; it does no I/O:
//! - Domain types (regimes, indicators, asset classes, bands, diagnostics)
//! - Indicator scorer, likelihood aggregator, Bayesian smoother
//! - Hysteresis lock, transition gate and decay limiter
//! - Allocation band mapper and rebalancer
//! - Period-by-period backtest simulator with weight drift
//!
//! State between periods is an explicit value ([`detection::RegimeState`])
//! threaded by the caller.

pub mod allocation;
pub mod detection;
pub mod domain;
pub mod engine;

#[cfg(test)]
mod tests {
    use super::*;

    /// Compile-time check: result and config types are Send + Sync so
    /// independent runs can move across worker threads.
    #[allow(dead_code)]
    fn assert_send_sync() {
        fn require_send<T: Send>() {}
        fn require_sync<T: Sync>() {}

        // Domain types
        require_send::<domain::IndicatorSnapshot>();
        require_sync::<domain::IndicatorSnapshot>();
        require_send::<domain::RegimeProbabilities>();
        require_sync::<domain::RegimeProbabilities>();
        require_send::<domain::BandSet>();
        require_sync::<domain::BandSet>();
        require_send::<domain::Diagnostic>();
        require_sync::<domain::Diagnostic>();

        // Detection
        require_send::<detection::RegimeDetection>();
        require_sync::<detection::RegimeDetection>();
        require_send::<detection::RegimeState>();
        require_sync::<detection::RegimeState>();
        require_send::<detection::DetectorConfig>();
        require_sync::<detection::DetectorConfig>();

        // Engine
        require_send::<engine::SimulatorConfig>();
        require_sync::<engine::SimulatorConfig>();
        require_send::<engine::MacroPoint>();
        require_sync::<engine::MacroPoint>();
        require_send::<engine::SimulationOutput>();
        require_sync::<engine::SimulationOutput>();
    }

    /// Architecture contract: detection takes its previous state by
    /// reference and returns a fresh value; there is no module-level state.
    #[test]
    fn detection_state_is_explicit() {
        fn _check_signature(
            snapshot: &domain::IndicatorSnapshot,
            state: &detection::RegimeState,
            config: &detection::DetectorConfig,
        ) -> detection::RegimeDetection {
            detection::detect_regime(snapshot, state, config)
        }
    }
}
