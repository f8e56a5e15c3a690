use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::asset_class::AssetClass;
use super::error::ConfigError;

/// Allowed allocation range for one asset class, with a preferred target.
///
/// Invariant: `0 <= min <= target <= max <= 1`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AllocationBand {
    pub min: f64,
    pub max: f64,
    pub target: f64,
}

impl AllocationBand {
    pub fn new(min: f64, max: f64, target: f64) -> Result<Self, ConfigError> {
        let band = Self { min, max, target };
        band.validate()?;
        Ok(band)
    }

    /// Unchecked constructor for the built-in tables.
    pub(crate) const fn fixed(min: f64, max: f64, target: f64) -> Self {
        Self { min, max, target }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ok = [self.min, self.max, self.target].iter().all(|v| v.is_finite())
            && 0.0 <= self.min
            && self.min <= self.target + 1e-12
            && self.target <= self.max + 1e-12
            && self.max <= 1.0;
        if ok {
            Ok(())
        } else {
            Err(ConfigError::Band {
                min: self.min,
                target: self.target,
                max: self.max,
            })
        }
    }

    pub fn contains(&self, weight: f64, tolerance: f64) -> bool {
        weight >= self.min - tolerance && weight <= self.max + tolerance
    }

    pub fn clamp(&self, weight: f64) -> f64 {
        weight.clamp(self.min, self.max)
    }
}

/// Per-asset-class bands for one regime (or one transition step).
pub type BandSet = BTreeMap<AssetClass, AllocationBand>;

/// Validate every band in a set.
pub fn validate_band_set(bands: &BandSet) -> Result<(), ConfigError> {
    for (class, band) in bands {
        band.validate().map_err(|e| ConfigError::BandFor {
            class: *class,
            reason: e.to_string(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_accepts_ordered_band() {
        let b = AllocationBand::new(0.1, 0.6, 0.3).unwrap();
        assert!(b.contains(0.1, 0.0));
        assert!(b.contains(0.6, 0.0));
        assert!(!b.contains(0.61, 0.0));
    }

    #[test]
    fn new_rejects_target_outside_range() {
        assert!(matches!(
            AllocationBand::new(0.2, 0.5, 0.6),
            Err(ConfigError::Band { .. })
        ));
        assert!(AllocationBand::new(-0.1, 0.5, 0.2).is_err());
        assert!(AllocationBand::new(0.0, 1.2, 0.2).is_err());
        assert!(AllocationBand::new(0.0, f64::NAN, 0.2).is_err());
    }

    #[test]
    fn band_set_error_names_class() {
        let mut set = BandSet::new();
        set.insert(AssetClass::Gold, AllocationBand::fixed(0.3, 0.1, 0.2));
        let err = validate_band_set(&set).unwrap_err();
        assert!(err.to_string().contains("GOLD"));
    }
}
