use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Fund identifier (scheme code, ticker, ...).
pub type FundId = String;

/// Fund → weight. Sums to 1 after a rebalance; drifts freely in between.
pub type PortfolioWeights = BTreeMap<FundId, f64>;

/// Fund → asset class, produced by an external classifier.
pub type FundMap = BTreeMap<FundId, AssetClass>;

/// The six asset classes allocation bands are defined over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AssetClass {
    Equity,
    Hybrid,
    DebtLong,
    DebtMedium,
    DebtShort,
    Gold,
}

impl AssetClass {
    pub const ALL: [AssetClass; 6] = [
        AssetClass::Equity,
        AssetClass::Hybrid,
        AssetClass::DebtLong,
        AssetClass::DebtMedium,
        AssetClass::DebtShort,
        AssetClass::Gold,
    ];

    pub fn label(self) -> &'static str {
        match self {
            AssetClass::Equity => "EQUITY",
            AssetClass::Hybrid => "HYBRID",
            AssetClass::DebtLong => "DEBT_LONG",
            AssetClass::DebtMedium => "DEBT_MEDIUM",
            AssetClass::DebtShort => "DEBT_SHORT",
            AssetClass::Gold => "GOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL.iter().copied().find(|c| c.label() == upper)
    }

    pub fn is_debt(self) -> bool {
        matches!(
            self,
            AssetClass::DebtLong | AssetClass::DebtMedium | AssetClass::DebtShort
        )
    }

    /// Modified duration used by the yield-change debt proxy.
    pub fn proxy_duration(self) -> f64 {
        match self {
            AssetClass::DebtLong => 7.0,
            _ => 2.0,
        }
    }
}

impl fmt::Display for AssetClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!(AssetClass::parse("debt_medium"), Some(AssetClass::DebtMedium));
        assert_eq!(AssetClass::parse(" GOLD "), Some(AssetClass::Gold));
        assert_eq!(AssetClass::parse("crypto"), None);
    }

    #[test]
    fn duration_is_seven_only_for_long_debt() {
        assert_eq!(AssetClass::DebtLong.proxy_duration(), 7.0);
        assert_eq!(AssetClass::DebtShort.proxy_duration(), 2.0);
        assert_eq!(AssetClass::DebtMedium.proxy_duration(), 2.0);
    }

    #[test]
    fn serde_uses_screaming_snake_case() {
        let json = serde_json::to_string(&AssetClass::DebtLong).unwrap();
        assert_eq!(json, "\"DEBT_LONG\"");
    }
}
