use std::collections::BTreeMap;

use crate::domain::{FundId, PortfolioWeights};

/// Drift weights through one period without trading:
/// `w_i · (1 + r_i) / (1 + r_p)`.
///
/// Returns `None` when `1 + r_p <= 0` (the portfolio was wiped out).
/// Funds with no entry in `fund_returns` are treated as flat.
pub fn drift_weights(
    weights: &PortfolioWeights,
    fund_returns: &BTreeMap<FundId, f64>,
    portfolio_return: f64,
) -> Option<PortfolioWeights> {
    let denom = 1.0 + portfolio_return;
    if denom <= 0.0 || !denom.is_finite() {
        return None;
    }
    Some(
        weights
            .iter()
            .map(|(fund, w)| {
                let r = fund_returns.get(fund).copied().unwrap_or(0.0);
                (fund.clone(), w * (1.0 + r) / denom)
            })
            .collect(),
    )
}
