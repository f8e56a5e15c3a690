//! Indicator scorer: macro indicators in, per-regime sigmoid scores out.
//!
//! Every threshold lives in a declarative table:
//! - [`SIGMOID_TABLE`] drives the six core indicator scores (regime C).
//! - [`REGIME_A`], [`REGIME_B`], [`REGIME_D`] are weighted sigmoid formulas.
//!
//! All functions are pure. Missing indicators resolve to their neutral
//! default and produce a [`Diagnostic::DefaultIndicator`].

use serde::{Deserialize, Serialize};

use crate::domain::{Diagnostic, Indicator, IndicatorSnapshot, Regime, RegimeProbabilities};

/// Logistic function `1 / (1 + exp(-x))`.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Whether a term's score rises or falls with the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Rising,
    Falling,
}

impl Direction {
    fn sign(self) -> f64 {
        match self {
            Direction::Rising => 1.0,
            Direction::Falling => -1.0,
        }
    }
}

/// One sigmoid transform: `s(k · (dir · (x − center) − θ))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SigmoidTerm {
    pub indicator: Indicator,
    pub k: f64,
    pub theta: f64,
    pub center: f64,
    pub direction: Direction,
    pub weight: f64,
}

impl SigmoidTerm {
    const fn rising(indicator: Indicator, k: f64, theta: f64, weight: f64) -> Self {
        Self {
            indicator,
            k,
            theta,
            center: 0.0,
            direction: Direction::Rising,
            weight,
        }
    }

    const fn falling(indicator: Indicator, k: f64, theta: f64, weight: f64) -> Self {
        Self {
            indicator,
            k,
            theta,
            center: 0.0,
            direction: Direction::Falling,
            weight,
        }
    }

    pub fn score(&self, x: f64) -> f64 {
        sigmoid(self.k * (self.direction.sign() * (x - self.center) - self.theta))
    }
}

/// Core indicator table. The weights are the regime-C weights.
pub const SIGMOID_TABLE: [SigmoidTerm; 6] = [
    // Low or negative real rates score high.
    SigmoidTerm {
        indicator: Indicator::RealRate,
        k: 2.5,
        theta: 0.0,
        center: 1.0,
        direction: Direction::Falling,
        weight: 0.20,
    },
    SigmoidTerm::rising(Indicator::DebtStress, 1.2, 3.0, 0.18),
    SigmoidTerm::rising(Indicator::BondEquityCorr, 2.5, 0.0, 0.18),
    SigmoidTerm::rising(Indicator::CbGoldBuying, 0.05, 80.0, 0.10),
    SigmoidTerm::rising(Indicator::InflationVol, 1.5, 2.0, 0.14),
    SigmoidTerm::rising(Indicator::VolatilityRatio, 1.8, 1.0, 0.20),
];

/// A regime score: convex combination of sigmoid terms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RegimeFormula {
    pub regime: Regime,
    pub terms: &'static [SigmoidTerm],
}

/// Monetary credibility: high real rate, bonds hedging equities, positive term premium.
pub const REGIME_A: RegimeFormula = RegimeFormula {
    regime: Regime::A,
    terms: &[
        SigmoidTerm::rising(Indicator::RealRate, 2.0, 1.5, 0.45),
        SigmoidTerm::falling(Indicator::BondEquityCorr, 4.0, 0.3, 0.35),
        SigmoidTerm::rising(Indicator::TermPremium, 2.0, 0.5, 0.20),
    ],
};

/// Disinflationary growth: negative correlation, falling momentum, steepening curve.
pub const REGIME_B: RegimeFormula = RegimeFormula {
    regime: Regime::B,
    terms: &[
        SigmoidTerm::falling(Indicator::BondEquityCorr, 4.0, 0.0, 0.45),
        SigmoidTerm::falling(Indicator::InflationMomentum, 3.0, 0.25, 0.20),
        SigmoidTerm::falling(Indicator::GrowthMomentum, 3.0, 0.25, 0.15),
        SigmoidTerm::rising(Indicator::TermPremium, 2.0, 0.5, 0.20),
    ],
};

/// Crisis: volatility, wide spreads, correlation toward 1, tight liquidity.
pub const REGIME_D: RegimeFormula = RegimeFormula {
    regime: Regime::D,
    terms: &[
        SigmoidTerm::rising(Indicator::Volatility, 2.0, 0.0, 0.35),
        SigmoidTerm::rising(Indicator::CreditSpread, 2.0, 0.0, 0.25),
        SigmoidTerm::rising(Indicator::BondEquityCorr, 5.0, 0.8, 0.20),
        SigmoidTerm::falling(Indicator::GlobalLiquidity, 2.0, 0.0, 0.20),
    ],
};

impl RegimeFormula {
    pub fn evaluate(&self, snapshot: &IndicatorSnapshot) -> f64 {
        self.terms
            .iter()
            .map(|t| t.weight * t.score(snapshot.value(t.indicator)))
            .sum()
    }

    pub fn weight_sum(&self) -> f64 {
        self.terms.iter().map(|t| t.weight).sum()
    }
}

/// Sigmoid score per core indicator, each in (0, 1).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorScores {
    pub real_rate: f64,
    pub debt_stress: f64,
    pub bond_equity_corr: f64,
    pub cb_gold_buying: f64,
    pub inflation_vol: f64,
    pub volatility_ratio: f64,
}

impl IndicatorScores {
    pub fn get(&self, indicator: Indicator) -> Option<f64> {
        match indicator {
            Indicator::RealRate => Some(self.real_rate),
            Indicator::DebtStress => Some(self.debt_stress),
            Indicator::BondEquityCorr => Some(self.bond_equity_corr),
            Indicator::CbGoldBuying => Some(self.cb_gold_buying),
            Indicator::InflationVol => Some(self.inflation_vol),
            Indicator::VolatilityRatio => Some(self.volatility_ratio),
            _ => None,
        }
    }

    fn set(&mut self, indicator: Indicator, score: f64) {
        match indicator {
            Indicator::RealRate => self.real_rate = score,
            Indicator::DebtStress => self.debt_stress = score,
            Indicator::BondEquityCorr => self.bond_equity_corr = score,
            Indicator::CbGoldBuying => self.cb_gold_buying = score,
            Indicator::InflationVol => self.inflation_vol = score,
            Indicator::VolatilityRatio => self.volatility_ratio = score,
            _ => {}
        }
    }
}

/// Un-normalized regime scores.
pub type RawRegimeScores = RegimeProbabilities;

/// Output of [`score_indicators`].
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSnapshot {
    pub scores: IndicatorScores,
    pub raw: RawRegimeScores,
    pub diagnostics: Vec<Diagnostic>,
}

/// Score the six core indicators against [`SIGMOID_TABLE`].
pub fn core_scores(snapshot: &IndicatorSnapshot) -> IndicatorScores {
    let mut scores = IndicatorScores::default();
    for term in &SIGMOID_TABLE {
        scores.set(term.indicator, term.score(snapshot.value(term.indicator)));
    }
    scores
}

/// Regime C: weighted sum of the core scores, clamped to [0, 1].
pub fn regime_c_score(scores: &IndicatorScores) -> f64 {
    SIGMOID_TABLE
        .iter()
        .map(|t| t.weight * scores.get(t.indicator).unwrap_or(0.0))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Full scorer: core scores, four raw regime scores, and a diagnostic per
/// defaulted indicator.
pub fn score_indicators(snapshot: &IndicatorSnapshot) -> ScoredSnapshot {
    let diagnostics = Indicator::ALL
        .iter()
        .filter(|&&i| snapshot.resolve(i).defaulted)
        .map(|&indicator| Diagnostic::DefaultIndicator { indicator })
        .collect();

    let scores = core_scores(snapshot);
    let mut raw = RawRegimeScores::default();
    raw[Regime::A] = REGIME_A.evaluate(snapshot);
    raw[Regime::B] = REGIME_B.evaluate(snapshot);
    raw[Regime::C] = regime_c_score(&scores);
    raw[Regime::D] = REGIME_D.evaluate(snapshot);

    ScoredSnapshot {
        scores,
        raw,
        diagnostics,
    }
}
