//! Simulator inputs: macro points and per-fund daily return series.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::{FundId, IndicatorSnapshot};

/// Market levels used by the proxy-return fallback.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MarketProxies {
    pub equity_index: Option<f64>,
    pub gold_price: Option<f64>,
    /// Benchmark government bond yield, in percent (7.2 means 7.2%).
    pub bond_yield: Option<f64>,
}

/// One period of the macro series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MacroPoint {
    pub date: NaiveDate,
    pub indicators: IndicatorSnapshot,
    #[serde(default)]
    pub market: MarketProxies,
}

impl MacroPoint {
    pub fn new(date: NaiveDate, indicators: IndicatorSnapshot) -> Self {
        Self {
            date,
            indicators,
            market: MarketProxies::default(),
        }
    }

    pub fn with_market(mut self, market: MarketProxies) -> Self {
        self.market = market;
        self
    }
}

/// Fund → date → daily return (fraction). Gaps are allowed.
pub type FundReturns = BTreeMap<FundId, BTreeMap<NaiveDate, f64>>;
