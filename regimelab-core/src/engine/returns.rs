//! Realized period returns: real daily data where present, macro proxies
//! where not.
//!
//! A period spans `[date_i, date_{i+1})`. Funds with at least one daily
//! observation in the window compound their daily returns (missing days
//! count as 0). Funds with none fall back to the proxy for their asset
//! class.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use super::inputs::{FundReturns, MacroPoint, MarketProxies};
use crate::domain::{AssetClass, Diagnostic, FundId, FundMap, PortfolioWeights};

/// Where a period's return came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    /// Every held fund had daily data.
    Real,
    /// No held fund had daily data.
    Proxy,
    /// Some funds real, some proxied.
    Mixed,
    /// No return measured (empty weights or no forward period).
    None,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PeriodReturn {
    pub portfolio_return: f64,
    pub fund_returns: BTreeMap<FundId, f64>,
    /// Buy-and-hold daily portfolio returns. Only filled for `Real` periods.
    pub daily_returns: Vec<f64>,
    pub source: DataSource,
    pub diagnostics: Vec<Diagnostic>,
}

impl PeriodReturn {
    fn flat(weights: &PortfolioWeights, diagnostics: Vec<Diagnostic>) -> Self {
        Self {
            portfolio_return: 0.0,
            fund_returns: weights.keys().map(|f| (f.clone(), 0.0)).collect(),
            daily_returns: Vec::new(),
            source: DataSource::None,
            diagnostics,
        }
    }
}

fn pct_change(start: Option<f64>, end: Option<f64>) -> Option<f64> {
    match (start, end) {
        (Some(a), Some(b)) if a > 0.0 && a.is_finite() && b.is_finite() => Some(b / a - 1.0),
        _ => None,
    }
}

/// Duration-weighted yield-change approximation; yields in percent.
///
/// `((y_prev − y_cur) · duration + y_prev / 12) / 100`
pub fn debt_proxy(y_prev: f64, y_cur: f64, duration: f64) -> f64 {
    ((y_prev - y_cur) * duration + y_prev / 12.0) / 100.0
}

/// Proxy return for an asset class between two market observations.
///
/// HYBRID blends the equity proxy 50/50 with the duration-2 debt proxy.
pub fn proxy_return(class: AssetClass, start: &MarketProxies, end: &MarketProxies) -> Option<f64> {
    let debt = |duration: f64| match (start.bond_yield, end.bond_yield) {
        (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some(debt_proxy(a, b, duration)),
        _ => None,
    };
    match class {
        AssetClass::Equity => pct_change(start.equity_index, end.equity_index),
        AssetClass::Gold => pct_change(start.gold_price, end.gold_price),
        AssetClass::DebtLong | AssetClass::DebtMedium | AssetClass::DebtShort => debt(class.proxy_duration()),
        AssetClass::Hybrid => {
            let eq = pct_change(start.equity_index, end.equity_index)?;
            let debt = debt(AssetClass::Hybrid.proxy_duration())?;
            Some(0.5 * eq + 0.5 * debt)
        }
    }
}

/// Realized return of `weights` over the period starting at `start`.
pub fn period_return(
    weights: &PortfolioWeights,
    fund_map: &FundMap,
    fund_returns: &FundReturns,
    start: &MacroPoint,
    end: Option<&MacroPoint>,
) -> PeriodReturn {
    if weights.is_empty() {
        return PeriodReturn::flat(weights, Vec::new());
    }
    let Some(end) = end else {
        return PeriodReturn::flat(weights, vec![Diagnostic::NoForwardPeriod]);
    };

    let window = start.date..end.date;
    let mut real: BTreeMap<&FundId, &BTreeMap<_, f64>> = BTreeMap::new();
    let mut dates = BTreeSet::new();
    for fund in weights.keys() {
        if let Some(series) = fund_returns.get(fund) {
            let mut in_window = series.range(window.clone()).peekable();
            if in_window.peek().is_some() {
                dates.extend(in_window.map(|(d, _)| *d));
                real.insert(fund, series);
            }
        }
    }

    let mut diagnostics = Vec::new();
    let mut fund_returns_out = BTreeMap::new();
    let mut growth: BTreeMap<&FundId, f64> = real.keys().map(|f| (*f, 1.0)).collect();
    let mut daily_returns = Vec::new();
    let all_real = real.len() == weights.len();

    let mut prev_value: f64 = weights.iter().filter(|(f, _)| real.contains_key(f)).map(|(_, w)| w).sum();
    for date in &dates {
        for (fund, series) in &real {
            let r = series.get(date).copied().filter(|r| r.is_finite()).unwrap_or(0.0);
            if let Some(g) = growth.get_mut(fund) {
                *g *= 1.0 + r;
            }
        }
        if all_real {
            let value: f64 = growth.iter().map(|(f, g)| weights[*f] * g).sum();
            daily_returns.push(if prev_value > 0.0 { value / prev_value - 1.0 } else { 0.0 });
            prev_value = value;
        }
    }

    for fund in weights.keys() {
        let r = match growth.get(fund) {
            Some(g) => g - 1.0,
            None => {
                let Some(&class) = fund_map.get(fund) else {
                    fund_returns_out.insert(fund.clone(), 0.0);
                    continue;
                };
                match proxy_return(class, &start.market, &end.market) {
                    Some(r) => {
                        diagnostics.push(Diagnostic::ProxyReturn {
                            fund: fund.clone(),
                            asset_class: class,
                        });
                        r
                    }
                    None => {
                        let d = Diagnostic::MissingProxyInput { asset_class: class };
                        if !diagnostics.contains(&d) {
                            diagnostics.push(d);
                        }
                        0.0
                    }
                }
            }
        };
        fund_returns_out.insert(fund.clone(), r);
    }

    let portfolio_return = weights.iter().map(|(f, w)| w * fund_returns_out[f]).sum();
    let source = if all_real {
        DataSource::Real
    } else if real.is_empty() {
        DataSource::Proxy
    } else {
        DataSource::Mixed
    };

    PeriodReturn {
        portfolio_return,
        fund_returns: fund_returns_out,
        daily_returns,
        source,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::IndicatorSnapshot;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn point(y: i32, m: u32, market: MarketProxies) -> MacroPoint {
        MacroPoint::new(date(y, m, 1), IndicatorSnapshot::new()).with_market(market)
    }

    fn weights(entries: &[(&str, f64)]) -> PortfolioWeights {
        entries.iter().map(|(f, w)| (f.to_string(), *w)).collect()
    }

    fn map(entries: &[(&str, AssetClass)]) -> FundMap {
        entries.iter().map(|(f, c)| (f.to_string(), *c)).collect()
    }

    #[test]
    fn debt_proxy_matches_formula() {
        // yield falls 7.0 → 6.5 at duration 7: price gain 3.5% plus carry 7/12%.
        let r = debt_proxy(7.0, 6.5, 7.0);
        assert!((r - (0.5 * 7.0 + 7.0 / 12.0) / 100.0).abs() < 1e-12);
    }

    #[test]
    fn hybrid_blends_equity_and_debt() {
        let a = MarketProxies {
            equity_index: Some(100.0),
            gold_price: None,
            bond_yield: Some(6.0),
        };
        let b = MarketProxies {
            equity_index: Some(110.0),
            gold_price: None,
            bond_yield: Some(6.0),
        };
        let r = proxy_return(AssetClass::Hybrid, &a, &b).unwrap();
        assert!((r - (0.5 * 0.10 + 0.5 * 0.005)).abs() < 1e-12);
        assert_eq!(proxy_return(AssetClass::Gold, &a, &b), None);
    }

    #[test]
    fn real_daily_returns_compound() {
        let w = weights(&[("A", 0.6), ("B", 0.4)]);
        let m = map(&[("A", AssetClass::Equity), ("B", AssetClass::DebtShort)]);
        let mut fr = FundReturns::new();
        fr.insert(
            "A".into(),
            [(date(2021, 1, 4), 0.01), (date(2021, 1, 5), -0.02), (date(2021, 2, 1), 0.5)]
                .into_iter()
                .collect(),
        );
        fr.insert("B".into(), [(date(2021, 1, 5), 0.001)].into_iter().collect());

        let start = point(2021, 1, MarketProxies::default());
        let end = point(2021, 2, MarketProxies::default());
        let out = period_return(&w, &m, &fr, &start, Some(&end));

        assert_eq!(out.source, DataSource::Real);
        let ra = 1.01 * 0.98 - 1.0;
        let rb = 0.001;
        assert!((out.fund_returns["A"] - ra).abs() < 1e-12);
        assert!((out.portfolio_return - (0.6 * ra + 0.4 * rb)).abs() < 1e-12);

        // The 2021-02-01 observation belongs to the next period.
        assert_eq!(out.daily_returns.len(), 2);
        let compounded = out.daily_returns.iter().fold(1.0, |acc, r| acc * (1.0 + r)) - 1.0;
        assert!((compounded - out.portfolio_return).abs() < 1e-12);
    }

    #[test]
    fn missing_fund_data_uses_proxy() {
        let w = weights(&[("EQ", 1.0)]);
        let m = map(&[("EQ", AssetClass::Equity)]);
        let start = point(
            2021,
            1,
            MarketProxies {
                equity_index: Some(200.0),
                ..Default::default()
            },
        );
        let end = point(
            2021,
            2,
            MarketProxies {
                equity_index: Some(190.0),
                ..Default::default()
            },
        );
        let out = period_return(&w, &m, &FundReturns::new(), &start, Some(&end));
        assert_eq!(out.source, DataSource::Proxy);
        assert!((out.portfolio_return + 0.05).abs() < 1e-12);
        assert!(out.daily_returns.is_empty());
        assert!(matches!(out.diagnostics[0], Diagnostic::ProxyReturn { .. }));
    }

    #[test]
    fn missing_proxy_input_returns_zero() {
        let w = weights(&[("GD", 1.0)]);
        let m = map(&[("GD", AssetClass::Gold)]);
        let start = point(2021, 1, MarketProxies::default());
        let end = point(2021, 2, MarketProxies::default());
        let out = period_return(&w, &m, &FundReturns::new(), &start, Some(&end));
        assert_eq!(out.portfolio_return, 0.0);
        assert_eq!(
            out.diagnostics,
            vec![Diagnostic::MissingProxyInput {
                asset_class: AssetClass::Gold
            }]
        );
    }

    #[test]
    fn last_period_has_no_forward_return() {
        let w = weights(&[("EQ", 1.0)]);
        let m = map(&[("EQ", AssetClass::Equity)]);
        let start = point(2021, 1, MarketProxies::default());
        let out = period_return(&w, &m, &FundReturns::new(), &start, None);
        assert_eq!(out.portfolio_return, 0.0);
        assert_eq!(out.source, DataSource::None);
        assert_eq!(out.diagnostics, vec![Diagnostic::NoForwardPeriod]);
    }

    #[test]
    fn mixed_period_skips_daily_series() {
        let w = weights(&[("A", 0.5), ("G", 0.5)]);
        let m = map(&[("A", AssetClass::Equity), ("G", AssetClass::Gold)]);
        let mut fr = FundReturns::new();
        fr.insert("A".into(), [(date(2021, 1, 4), 0.02)].into_iter().collect());
        let start = point(
            2021,
            1,
            MarketProxies {
                gold_price: Some(50.0),
                ..Default::default()
            },
        );
        let end = point(
            2021,
            2,
            MarketProxies {
                gold_price: Some(55.0),
                ..Default::default()
            },
        );
        let out = period_return(&w, &m, &fr, &start, Some(&end));
        assert_eq!(out.source, DataSource::Mixed);
        assert!(out.daily_returns.is_empty());
        assert!((out.portfolio_return - (0.5 * 0.02 + 0.5 * 0.1)).abs() < 1e-12);
    }
}
