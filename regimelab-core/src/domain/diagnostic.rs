use serde::{Deserialize, Serialize};
use std::fmt;

use super::asset_class::{AssetClass, FundId};
use super::indicator::Indicator;

/// A fallback the pipeline took instead of failing.
///
/// None of these abort a run; they travel alongside the result so callers can
/// mark affected periods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Diagnostic {
    /// Indicator absent or non-finite; the neutral default was scored.
    DefaultIndicator { indicator: Indicator },
    /// Fund had no daily returns in the period; a macro proxy stood in.
    ProxyReturn { fund: FundId, asset_class: AssetClass },
    /// A macro proxy needed an input that was missing; the return is 0.
    MissingProxyInput { asset_class: AssetClass },
    /// Rebalance produced a zero total; weights left empty.
    DegenerateWeights,
    /// Band minimums exceed 1 or maximums fall short of 1; targets were
    /// normalized proportionally instead.
    InfeasibleBands { min_sum: f64, max_sum: f64 },
    /// Regime bands allocate to a class no fund belongs to.
    EmptyAssetClass { asset_class: AssetClass },
    /// Last period has no following point to measure a return over.
    NoForwardPeriod,
    /// Portfolio lost everything in the period; weights were not drifted.
    TotalLoss,
}

impl Diagnostic {
    /// True for fallbacks that change the realized return of a period.
    pub fn affects_return(&self) -> bool {
        matches!(
            self,
            Diagnostic::ProxyReturn { .. }
                | Diagnostic::MissingProxyInput { .. }
                | Diagnostic::DegenerateWeights
                | Diagnostic::NoForwardPeriod
                | Diagnostic::TotalLoss
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::DefaultIndicator { indicator } => {
                write!(f, "{indicator} missing, neutral default used")
            }
            Diagnostic::ProxyReturn { fund, asset_class } => {
                write!(f, "{fund} has no return data, {asset_class} proxy used")
            }
            Diagnostic::MissingProxyInput { asset_class } => {
                write!(f, "{asset_class} proxy input missing, return set to 0")
            }
            Diagnostic::DegenerateWeights => f.write_str("rebalance weights sum to zero"),
            Diagnostic::InfeasibleBands { min_sum, max_sum } => write!(
                f,
                "bands cannot sum to 1 (min sum {min_sum:.4}, max sum {max_sum:.4})"
            ),
            Diagnostic::EmptyAssetClass { asset_class } => {
                write!(f, "no fund maps to {asset_class}")
            }
            Diagnostic::NoForwardPeriod => f.write_str("no forward period, return set to 0"),
            Diagnostic::TotalLoss => f.write_str("portfolio return of -100%"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_type_tag() {
        let d = Diagnostic::EmptyAssetClass {
            asset_class: AssetClass::Gold,
        };
        let json = serde_json::to_string(&d).unwrap();
        assert_eq!(json, r#"{"type":"EMPTY_ASSET_CLASS","asset_class":"GOLD"}"#);
    }

    #[test]
    fn default_indicator_does_not_affect_return() {
        let d = Diagnostic::DefaultIndicator {
            indicator: Indicator::RealRate,
        };
        assert!(!d.affects_return());
        assert!(Diagnostic::NoForwardPeriod.affects_return());
    }
}
