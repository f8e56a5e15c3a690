//! Allocation: regime bands and the rebalancer.

pub mod bands;
pub mod rebalance;

pub use bands::{
    asset_class_weights, bands_for, missing_asset_classes, populated_classes, transition_bands, validate_allocation,
    BandViolation, BAND_TOLERANCE,
};
pub use rebalance::{fill_to_unity, rebalance, ExpectedReturns, FillOutcome, RebalanceOutcome};
