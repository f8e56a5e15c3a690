use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Tolerance for the probability-simplex invariant.
pub const SIMPLEX_TOLERANCE: f64 = 1e-6;

/// One of the four macro-financial regimes.
///
/// Declaration order is the tie-break priority: A > B > C > D.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Regime {
    /// Monetary credibility: positive real rates, bonds hedge equities.
    #[serde(rename = "REGIME_A")]
    A,
    /// Disinflationary growth: falling inflation, easing is credible.
    #[serde(rename = "REGIME_B")]
    B,
    /// Fiscal dominance / financial repression.
    #[serde(rename = "REGIME_C")]
    C,
    /// Crisis / trust shock.
    #[serde(rename = "REGIME_D")]
    D,
}

impl Regime {
    /// All regimes in tie-break priority order.
    pub const ALL: [Regime; 4] = [Regime::A, Regime::B, Regime::C, Regime::D];

    pub fn index(self) -> usize {
        match self {
            Regime::A => 0,
            Regime::B => 1,
            Regime::C => 2,
            Regime::D => 3,
        }
    }

    /// Wire identifier (`REGIME_A` ...).
    pub fn id(self) -> &'static str {
        match self {
            Regime::A => "REGIME_A",
            Regime::B => "REGIME_B",
            Regime::C => "REGIME_C",
            Regime::D => "REGIME_D",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Regime::A => "Monetary Credibility",
            Regime::B => "Disinflationary Growth",
            Regime::C => "Fiscal Dominance / Financial Repression",
            Regime::D => "Crisis / Trust Shock",
        }
    }

    /// Stress regimes carry no long-duration debt.
    pub fn is_stress(self) -> bool {
        matches!(self, Regime::C | Regime::D)
    }

    /// Parse either the wire id (`REGIME_C`) or the bare letter (`C`).
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "A" | "REGIME_A" => Some(Regime::A),
            "B" | "REGIME_B" => Some(Regime::B),
            "C" | "REGIME_C" => Some(Regime::C),
            "D" | "REGIME_D" => Some(Regime::D),
            _ => None,
        }
    }
}

impl fmt::Display for Regime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

/// Probability per regime, indexed by [`Regime`].
///
/// After any normalization step the values sum to 1 within
/// [`SIMPLEX_TOLERANCE`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct RegimeProbabilities(pub [f64; 4]);

impl RegimeProbabilities {
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self([a, b, c, d])
    }

    /// Equal mass on all four regimes.
    pub fn uniform() -> Self {
        Self([0.25; 4])
    }

    pub fn get(&self, regime: Regime) -> f64 {
        self.0[regime.index()]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Divide by the sum; a zero (or non-finite) sum divides by 1 instead.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        let total = if total > 0.0 && total.is_finite() { total } else { 1.0 };
        let mut out = self.0;
        for p in &mut out {
            *p /= total;
        }
        Self(out)
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() <= SIMPLEX_TOLERANCE
    }

    /// Highest-probability regime; ties go to the first in A > B > C > D order.
    pub fn argmax(&self) -> Regime {
        let mut best = Regime::A;
        for regime in Regime::ALL {
            if self.get(regime) > self.get(best) {
                best = regime;
            }
        }
        best
    }

    /// Largest probability among the regimes other than `exclude`.
    pub fn highest_excluding(&self, exclude: Regime) -> f64 {
        Regime::ALL
            .iter()
            .filter(|&&r| r != exclude)
            .map(|&r| self.get(r))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Second-largest probability (equal to the largest on a tie).
    pub fn second_highest(&self) -> f64 {
        self.highest_excluding(self.argmax())
    }

    pub fn iter(&self) -> impl Iterator<Item = (Regime, f64)> + '_ {
        Regime::ALL.iter().map(move |&r| (r, self.get(r)))
    }
}

impl Index<Regime> for RegimeProbabilities {
    type Output = f64;

    fn index(&self, regime: Regime) -> &f64 {
        &self.0[regime.index()]
    }
}

impl IndexMut<Regime> for RegimeProbabilities {
    fn index_mut(&mut self, regime: Regime) -> &mut f64 {
        &mut self.0[regime.index()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn argmax_breaks_ties_in_priority_order() {
        let p = RegimeProbabilities::uniform();
        assert_eq!(p.argmax(), Regime::A);

        let p = RegimeProbabilities::new(0.1, 0.3, 0.3, 0.3);
        assert_eq!(p.argmax(), Regime::B);

        let p = RegimeProbabilities::new(0.1, 0.2, 0.35, 0.35);
        assert_eq!(p.argmax(), Regime::C);
    }

    #[test]
    fn normalized_sums_to_one() {
        let p = RegimeProbabilities::new(0.4, 0.9, 0.2, 0.5).normalized();
        assert!(p.is_normalized());
        assert!((p[Regime::B] - 0.9 / 2.0).abs() < 1e-12);
    }

    #[test]
    fn zero_sum_normalization_is_guarded() {
        let p = RegimeProbabilities::default().normalized();
        assert_eq!(p.0, [0.0; 4]);
    }

    #[test]
    fn highest_excluding_skips_the_given_regime() {
        let p = RegimeProbabilities::new(0.5, 0.3, 0.15, 0.05);
        assert!((p.highest_excluding(Regime::A) - 0.3).abs() < 1e-12);
        assert!((p.highest_excluding(Regime::B) - 0.5).abs() < 1e-12);
        assert!((p.second_highest() - 0.3).abs() < 1e-12);

        let tied = RegimeProbabilities::new(0.4, 0.4, 0.1, 0.1);
        assert!((tied.second_highest() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn parse_accepts_letter_and_wire_id() {
        assert_eq!(Regime::parse("c"), Some(Regime::C));
        assert_eq!(Regime::parse("REGIME_D"), Some(Regime::D));
        assert_eq!(Regime::parse("MARKET_WEIGHT"), None);
    }

    #[test]
    fn serde_uses_wire_ids() {
        let json = serde_json::to_string(&Regime::C).unwrap();
        assert_eq!(json, "\"REGIME_C\"");
        let back: Regime = serde_json::from_str("\"REGIME_B\"").unwrap();
        assert_eq!(back, Regime::B);
    }
}
