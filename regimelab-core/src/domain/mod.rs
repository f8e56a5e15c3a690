//! Domain types for RegimeLab

pub mod asset_class;
pub mod band;
pub mod diagnostic;
pub mod error;
pub mod indicator;
pub mod regime;

pub use asset_class::{AssetClass, FundId, FundMap, PortfolioWeights};
pub use band::{validate_band_set, AllocationBand, BandSet};
pub use diagnostic::Diagnostic;
pub use error::ConfigError;
pub use indicator::{Indicator, IndicatorSnapshot, Resolved};
pub use regime::{Regime, RegimeProbabilities, SIMPLEX_TOLERANCE};
