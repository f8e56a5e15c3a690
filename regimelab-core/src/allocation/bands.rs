//! Allocation band mapper: regime (or a transition in progress) to
//! per-asset-class {min, max, target} bands.
//!
//! Stress regimes (C, D) carry no long-duration debt.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{AllocationBand, AssetClass, BandSet, FundMap, PortfolioWeights, Regime};

/// Slack allowed when checking drifted weights against bands.
pub const BAND_TOLERANCE: f64 = 1e-9;

const fn b(min: f64, max: f64, target: f64) -> AllocationBand {
    AllocationBand::fixed(min, max, target)
}

// Column order follows `AssetClass::ALL`:
// EQUITY, HYBRID, DEBT_LONG, DEBT_MEDIUM, DEBT_SHORT, GOLD.

const REGIME_A_BANDS: [AllocationBand; 6] = [
    b(0.50, 0.65, 0.575),
    b(0.10, 0.15, 0.125),
    b(0.00, 0.25, 0.15),
    b(0.05, 0.25, 0.10),
    b(0.00, 0.10, 0.05),
    b(0.00, 0.05, 0.00),
];

const REGIME_B_BANDS: [AllocationBand; 6] = [
    b(0.45, 0.65, 0.50),
    b(0.05, 0.20, 0.125),
    b(0.00, 0.30, 0.20),
    b(0.10, 0.30, 0.125),
    b(0.02, 0.08, 0.05),
    b(0.02, 0.06, 0.04),
];

const REGIME_C_BANDS: [AllocationBand; 6] = [
    b(0.40, 0.50, 0.43),
    b(0.10, 0.12, 0.11),
    b(0.00, 0.00, 0.00),
    b(0.15, 0.25, 0.19),
    b(0.15, 0.20, 0.17),
    b(0.05, 0.15, 0.10),
];

const REGIME_D_BANDS: [AllocationBand; 6] = [
    b(0.20, 0.30, 0.25),
    b(0.10, 0.20, 0.15),
    b(0.00, 0.00, 0.00),
    b(0.05, 0.15, 0.10),
    b(0.25, 0.45, 0.35),
    b(0.10, 0.20, 0.15),
];

fn table(regime: Regime) -> &'static [AllocationBand; 6] {
    match regime {
        Regime::A => &REGIME_A_BANDS,
        Regime::B => &REGIME_B_BANDS,
        Regime::C => &REGIME_C_BANDS,
        Regime::D => &REGIME_D_BANDS,
    }
}

/// Fixed bands for a regime, one per asset class.
pub fn bands_for(regime: Regime) -> BandSet {
    AssetClass::ALL
        .iter()
        .zip(table(regime).iter())
        .map(|(&class, &band)| (class, band))
        .collect()
}

/// Effective progress for one asset class during a transition.
///
/// C → B holds back duration risk and equity beta:
/// - GOLD moves linearly
/// - DEBT_MEDIUM moves at half speed until 75% elapsed
/// - EQUITY moves at half speed until 80%, then `0.4 + (p − 0.8) · 3`, capped at 1
pub fn class_progress(from: Regime, to: Regime, class: AssetClass, progress: f64) -> f64 {
    let p = progress.clamp(0.0, 1.0);
    if p >= 1.0 || from != Regime::C || to != Regime::B {
        return p;
    }
    match class {
        AssetClass::DebtMedium if p < 0.75 => p * 0.5,
        AssetClass::Equity if p < 0.8 => p * 0.5,
        AssetClass::Equity => (0.4 + (p - 0.8) * 3.0).min(1.0),
        _ => p,
    }
}

/// Bands interpolated between two regimes' tables.
pub fn transition_bands(from: Regime, to: Regime, progress: f64) -> BandSet {
    let lerp = |a: f64, b: f64, t: f64| a * (1.0 - t) + b * t;
    let from_bands = table(from);
    let to_bands = table(to);

    AssetClass::ALL
        .iter()
        .enumerate()
        .map(|(i, &class)| {
            let t = class_progress(from, to, class, progress);
            let (f, g) = (from_bands[i], to_bands[i]);
            let band = AllocationBand::fixed(
                lerp(f.min, g.min, t),
                lerp(f.max, g.max, t),
                lerp(f.target, g.target, t),
            );
            (class, band)
        })
        .collect()
}

/// Sum fund weights per asset class. Funds missing from the map are skipped.
pub fn asset_class_weights(weights: &PortfolioWeights, fund_map: &FundMap) -> BTreeMap<AssetClass, f64> {
    let mut out = BTreeMap::new();
    for (fund, w) in weights {
        if let Some(&class) = fund_map.get(fund) {
            *out.entry(class).or_insert(0.0) += w;
        }
    }
    out
}

/// A class weight outside its band.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BandViolation {
    pub asset_class: AssetClass,
    pub weight: f64,
    pub min: f64,
    pub max: f64,
}

/// Every band in `bands` whose class weight falls outside [min, max].
/// Absent classes count as weight 0.
pub fn validate_allocation(class_weights: &BTreeMap<AssetClass, f64>, bands: &BandSet) -> Vec<BandViolation> {
    bands
        .iter()
        .filter_map(|(&class, band)| {
            let weight = class_weights.get(&class).copied().unwrap_or(0.0);
            (!band.contains(weight, BAND_TOLERANCE)).then_some(BandViolation {
                asset_class: class,
                weight,
                min: band.min,
                max: band.max,
            })
        })
        .collect()
}

/// Classes the fund map populates.
pub fn populated_classes(fund_map: &FundMap) -> BTreeSet<AssetClass> {
    fund_map.values().copied().collect()
}

/// Classes the regime allocates to (target > 0) that no fund maps to.
pub fn missing_asset_classes(fund_map: &FundMap, regime: Regime) -> Vec<AssetClass> {
    let present = populated_classes(fund_map);
    bands_for(regime)
        .into_iter()
        .filter(|(class, band)| band.target > 0.0 && !present.contains(class))
        .map(|(class, _)| class)
        .collect()
}
