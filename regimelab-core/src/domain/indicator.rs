//! Macro indicator names and the per-period indicator snapshot.
//!
//! Every indicator has a documented neutral default, so a snapshot with
//! missing keys still resolves to a complete set of values. Non-finite
//! values (NaN, ±inf) are treated as missing.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The twelve macro indicators consumed by the scorer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Indicator {
    RealRate,
    DebtStress,
    BondEquityCorr,
    CbGoldBuying,
    InflationVol,
    VolatilityRatio,
    TermPremium,
    InflationMomentum,
    GrowthMomentum,
    CreditSpread,
    Volatility,
    GlobalLiquidity,
}

impl Indicator {
    /// The six indicators every regime-C score depends on.
    pub const CORE: [Indicator; 6] = [
        Indicator::RealRate,
        Indicator::DebtStress,
        Indicator::BondEquityCorr,
        Indicator::CbGoldBuying,
        Indicator::InflationVol,
        Indicator::VolatilityRatio,
    ];

    pub const ALL: [Indicator; 12] = [
        Indicator::RealRate,
        Indicator::DebtStress,
        Indicator::BondEquityCorr,
        Indicator::CbGoldBuying,
        Indicator::InflationVol,
        Indicator::VolatilityRatio,
        Indicator::TermPremium,
        Indicator::InflationMomentum,
        Indicator::GrowthMomentum,
        Indicator::CreditSpread,
        Indicator::Volatility,
        Indicator::GlobalLiquidity,
    ];

    /// Field name used in snapshots, CSV headers and JSON.
    pub fn key(self) -> &'static str {
        match self {
            Indicator::RealRate => "realRate",
            Indicator::DebtStress => "debtStress",
            Indicator::BondEquityCorr => "bondEquityCorr",
            Indicator::CbGoldBuying => "cbGoldBuying",
            Indicator::InflationVol => "inflationVol",
            Indicator::VolatilityRatio => "volatilityRatio",
            Indicator::TermPremium => "termPremium",
            Indicator::InflationMomentum => "inflationMomentum",
            Indicator::GrowthMomentum => "growthMomentum",
            Indicator::CreditSpread => "creditSpread",
            Indicator::Volatility => "volatility",
            Indicator::GlobalLiquidity => "globalLiquidity",
        }
    }

    /// Neutral value used when the snapshot has no (finite) entry.
    pub fn neutral_default(self) -> f64 {
        match self {
            Indicator::RealRate => 1.5,
            Indicator::DebtStress => 5.0,
            Indicator::BondEquityCorr => -0.1,
            Indicator::CbGoldBuying => 50.0,
            Indicator::InflationVol => 1.5,
            Indicator::VolatilityRatio => 0.8,
            Indicator::TermPremium
            | Indicator::InflationMomentum
            | Indicator::GrowthMomentum
            | Indicator::CreditSpread
            | Indicator::Volatility
            | Indicator::GlobalLiquidity => 0.0,
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|i| i.key() == key)
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// A resolved indicator value and whether the neutral default stood in for it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved {
    pub value: f64,
    pub defaulted: bool,
}

/// Immutable indicator readings for one period.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSnapshot {
    values: BTreeMap<Indicator, f64>,
}

impl IndicatorSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, indicator: Indicator, value: f64) -> Self {
        self.values.insert(indicator, value);
        self
    }

    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        self.values.get(&indicator).copied().filter(|v| v.is_finite())
    }

    pub fn resolve(&self, indicator: Indicator) -> Resolved {
        match self.get(indicator) {
            Some(value) => Resolved {
                value,
                defaulted: false,
            },
            None => Resolved {
                value: indicator.neutral_default(),
                defaulted: true,
            },
        }
    }

    /// Resolved value, ignoring whether it was defaulted.
    pub fn value(&self, indicator: Indicator) -> f64 {
        self.resolve(indicator).value
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Indicator, f64)> + '_ {
        self.values.iter().map(|(&k, &v)| (k, v))
    }
}

impl FromIterator<(Indicator, f64)> for IndicatorSnapshot {
    fn from_iter<T: IntoIterator<Item = (Indicator, f64)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
