//! Rebalancer: bands plus a fund→class map to fund weights that sum to 1.
//!
//! 1. Group funds by asset class. Classes without funds drop out.
//! 2. Class target = band target tilted by relative expected return
//!    (sensitivity 2.0), clamped to [min, max].
//! 3. [`fill_to_unity`] closes the gap to 1.0 proportionally to each class's
//!    headroom (short) or give-back room (long).
//! 4. Within a class, funds are tilted the same way (sensitivity 5.0,
//!    floor 0.01) and normalized to the class target.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{AllocationBand, AssetClass, BandSet, Diagnostic, FundId, FundMap, PortfolioWeights};

pub const CLASS_TILT_SENSITIVITY: f64 = 2.0;
pub const FUND_TILT_SENSITIVITY: f64 = 5.0;
pub const FUND_WEIGHT_FLOOR: f64 = 0.01;

/// Fund → expected return (annualized fraction). Supplied by an external
/// model; funds without an entry carry no tilt.
pub type ExpectedReturns = BTreeMap<FundId, f64>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RebalanceOutcome {
    pub weights: PortfolioWeights,
    pub class_targets: BTreeMap<AssetClass, f64>,
    pub diagnostics: Vec<Diagnostic>,
}

/// How [`fill_to_unity`] resolved the totals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillOutcome {
    /// Gap closed inside the bands.
    Filled,
    /// Bands cannot reach 1.0; values were scaled proportionally.
    Infeasible { min_sum: f64, max_sum: f64 },
    /// Nothing to scale.
    Degenerate,
}

/// Move `values` so they sum to exactly 1 without leaving their bands.
///
/// Shortfall is distributed by headroom `max − v`, excess by give-back room
/// `v − min`. When `Σmin > 1` or `Σmax < 1` no in-band solution exists and
/// the values are divided by their sum instead.
pub fn fill_to_unity(values: &mut [f64], bands: &[AllocationBand]) -> FillOutcome {
    debug_assert_eq!(values.len(), bands.len());
    let min_sum: f64 = bands.iter().map(|b| b.min).sum();
    let max_sum: f64 = bands.iter().map(|b| b.max).sum();
    let total: f64 = values.iter().sum();

    if min_sum > 1.0 + 1e-12 || max_sum < 1.0 - 1e-12 {
        if total <= 0.0 {
            return FillOutcome::Degenerate;
        }
        for v in values.iter_mut() {
            *v /= total;
        }
        return FillOutcome::Infeasible { min_sum, max_sum };
    }

    let gap = 1.0 - total;
    if gap > 0.0 {
        let room: Vec<f64> = values.iter().zip(bands).map(|(v, b)| (b.max - v).max(0.0)).collect();
        let room_sum: f64 = room.iter().sum();
        if room_sum > 0.0 {
            for (v, r) in values.iter_mut().zip(&room) {
                *v += gap * r / room_sum;
            }
        }
    } else if gap < 0.0 {
        let room: Vec<f64> = values.iter().zip(bands).map(|(v, b)| (v - b.min).max(0.0)).collect();
        let room_sum: f64 = room.iter().sum();
        if room_sum > 0.0 {
            for (v, r) in values.iter_mut().zip(&room) {
                *v += gap * r / room_sum;
            }
        }
    }
    FillOutcome::Filled
}

fn mean(xs: &[f64]) -> Option<f64> {
    if xs.is_empty() {
        None
    } else {
        Some(xs.iter().sum::<f64>() / xs.len() as f64)
    }
}

/// Compute target weights for the given bands.
pub fn rebalance(fund_map: &FundMap, bands: &BandSet, expected_returns: Option<&ExpectedReturns>) -> RebalanceOutcome {
    let mut diagnostics = Vec::new();

    let mut groups: BTreeMap<AssetClass, Vec<&FundId>> = BTreeMap::new();
    for (fund, class) in fund_map {
        if bands.contains_key(class) {
            groups.entry(*class).or_default().push(fund);
        }
    }
    for (class, band) in bands {
        if band.target > 0.0 && !groups.contains_key(class) {
            diagnostics.push(Diagnostic::EmptyAssetClass { asset_class: *class });
        }
    }
    if groups.is_empty() {
        diagnostics.push(Diagnostic::DegenerateWeights);
        return RebalanceOutcome {
            diagnostics,
            ..Default::default()
        };
    }

    let fund_er = |fund: &FundId| expected_returns.and_then(|er| er.get(fund).copied()).filter(|r| r.is_finite());

    // Class-level tilt.
    let classes: Vec<AssetClass> = groups.keys().copied().collect();
    let class_er: Vec<Option<f64>> = classes
        .iter()
        .map(|c| {
            let ers: Vec<f64> = groups[c].iter().filter_map(|f| fund_er(f)).collect();
            mean(&ers)
        })
        .collect();
    let known: Vec<f64> = class_er.iter().flatten().copied().collect();
    let cross_avg = mean(&known).unwrap_or(0.0);

    let class_bands: Vec<AllocationBand> = classes.iter().map(|c| bands[c]).collect();
    let mut targets: Vec<f64> = class_bands
        .iter()
        .zip(&class_er)
        .map(|(band, er)| {
            let tilt = er.map_or(0.0, |r| (r - cross_avg) * CLASS_TILT_SENSITIVITY);
            band.clamp(band.target + tilt)
        })
        .collect();

    match fill_to_unity(&mut targets, &class_bands) {
        FillOutcome::Filled => {}
        FillOutcome::Infeasible { min_sum, max_sum } => {
            diagnostics.push(Diagnostic::InfeasibleBands { min_sum, max_sum });
        }
        FillOutcome::Degenerate => {
            diagnostics.push(Diagnostic::DegenerateWeights);
            return RebalanceOutcome {
                diagnostics,
                ..Default::default()
            };
        }
    }

    // Fund-level tilt within each class.
    let mut weights = PortfolioWeights::new();
    let mut class_targets = BTreeMap::new();
    for ((class, target), er) in classes.iter().zip(&targets).zip(&class_er) {
        class_targets.insert(*class, *target);
        if *target <= 0.0 {
            continue;
        }
        let funds = &groups[class];
        let base = 1.0 / funds.len() as f64;
        let raw: Vec<f64> = funds
            .iter()
            .map(|f| {
                let tilt = match (fund_er(f), er) {
                    (Some(r), Some(avg)) => (r - avg) * FUND_TILT_SENSITIVITY,
                    _ => 0.0,
                };
                (base + tilt).max(FUND_WEIGHT_FLOOR)
            })
            .collect();
        let raw_sum: f64 = raw.iter().sum();
        for (fund, r) in funds.iter().zip(&raw) {
            weights.insert((*fund).clone(), target * r / raw_sum);
        }
    }

    RebalanceOutcome {
        weights,
        class_targets,
        diagnostics,
    }
}
