//! Backtest simulator: the period loop.
//!
//! Per period, strictly in date order:
//! 1. detect the regime, threading [`RegimeState`] from the previous period
//! 2. pick bands (interpolated while a transition is in progress)
//! 3. decide whether to rebalance: initial, regime change, cadence, band breach
//! 4. realize the period return (real daily data or macro proxies)
//! 5. drift weights, accumulate value, append a record

use chrono::NaiveDate;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::config::SimulatorConfig;
use super::drift::drift_weights;
use super::inputs::{FundReturns, MacroPoint};
use super::record::{BacktestPeriodRecord, RebalanceTrigger, RegimeTransition, SimulationOutput};
use super::returns::period_return;
use crate::allocation::{
    asset_class_weights, bands_for, populated_classes, rebalance, transition_bands, validate_allocation,
    ExpectedReturns,
};
use crate::detection::{detect_regime, RegimeState};
use crate::domain::{BandSet, ConfigError, Diagnostic, FundMap, PortfolioWeights, Regime};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimulationError {
    #[error("invalid config: {0}")]
    Config(#[from] ConfigError),
    #[error("macro points out of order at index {index}: {current} does not follow {previous}")]
    NotChronological {
        index: usize,
        previous: NaiveDate,
        current: NaiveDate,
    },
}

/// Borrowed inputs for one run.
#[derive(Debug, Clone, Copy)]
pub struct SimulationInput<'a> {
    pub points: &'a [MacroPoint],
    pub fund_map: &'a FundMap,
    pub fund_returns: &'a FundReturns,
    pub expected_returns: Option<&'a ExpectedReturns>,
}

#[derive(Debug, Clone, Copy)]
struct ActiveTransition {
    from: Regime,
    to: Regime,
    elapsed: u32,
}

fn check_chronological(points: &[MacroPoint]) -> Result<(), SimulationError> {
    for (index, pair) in points.windows(2).enumerate() {
        if pair[1].date <= pair[0].date {
            return Err(SimulationError::NotChronological {
                index: index + 1,
                previous: pair[0].date,
                current: pair[1].date,
            });
        }
    }
    Ok(())
}

fn breaches_bands(weights: &PortfolioWeights, fund_map: &FundMap, bands: &BandSet) -> bool {
    let populated = populated_classes(fund_map);
    let mut checked = bands.clone();
    checked.retain(|class, _| populated.contains(class));
    // No in-band allocation exists, so drift cannot breach anything.
    let min_sum: f64 = checked.values().map(|b| b.min).sum();
    let max_sum: f64 = checked.values().map(|b| b.max).sum();
    if min_sum > 1.0 + 1e-12 || max_sum < 1.0 - 1e-12 {
        return false;
    }
    !validate_allocation(&asset_class_weights(weights, fund_map), &checked).is_empty()
}

/// Run the simulation over `input.points`.
pub fn simulate(input: &SimulationInput<'_>, config: &SimulatorConfig) -> Result<SimulationOutput, SimulationError> {
    config.validate()?;
    check_chronological(input.points)?;

    let n = input.points.len();
    let mut records = Vec::with_capacity(n);
    let mut detections = Vec::with_capacity(n);
    let mut daily_returns = Vec::new();
    let mut transitions = Vec::new();

    let mut state = RegimeState::new();
    let mut weights = PortfolioWeights::new();
    let mut previous: Option<(NaiveDate, Regime)> = None;
    let mut active: Option<ActiveTransition> = None;
    let mut cumulative = 1.0;
    let mut value = config.initial_investment;

    for (i, point) in input.points.iter().enumerate() {
        let detection = detect_regime(&point.indicators, &state, &config.detector);
        let regime = detection.dominant;
        let mut diagnostics = Vec::new();

        let regime_changed = previous.is_some_and(|(_, prev)| prev != regime);
        if let (true, Some((_, from))) = (regime_changed, previous) {
            debug!(date = %point.date, %from, to = %regime, "regime transition");
            transitions.push(RegimeTransition {
                date: point.date,
                from,
                to: regime,
                confidence: detection.confidence,
            });
            if config.transition_periods.is_some() {
                active = Some(ActiveTransition {
                    from,
                    to: regime,
                    elapsed: 0,
                });
            }
        }

        let mut finished = false;
        let (bands, transition_progress) = match (active.as_mut(), config.transition_periods) {
            (Some(t), Some(total)) => {
                t.elapsed += 1;
                let progress = (t.elapsed as f64 / total as f64).min(1.0);
                finished = progress >= 1.0;
                (transition_bands(t.from, t.to, progress), Some(progress))
            }
            _ => (bands_for(regime), None),
        };
        if finished {
            active = None;
        }

        let trigger = if i == 0 {
            Some(RebalanceTrigger::Initial)
        } else if regime_changed {
            Some(RebalanceTrigger::RegimeChange)
        } else if previous.is_some_and(|(date, _)| config.cadence.is_due(date, point.date)) {
            Some(RebalanceTrigger::Cadence)
        } else if breaches_bands(&weights, input.fund_map, &bands) {
            Some(RebalanceTrigger::BandBreach)
        } else {
            None
        };

        if trigger.is_some() {
            let outcome = rebalance(input.fund_map, &bands, input.expected_returns);
            if outcome.diagnostics.contains(&Diagnostic::DegenerateWeights) {
                warn!(date = %point.date, %regime, "rebalance produced no weights");
            }
            weights = outcome.weights;
            diagnostics.extend(outcome.diagnostics);
        }

        let held = weights.clone();
        let realized = period_return(
            &weights,
            input.fund_map,
            input.fund_returns,
            point,
            input.points.get(i + 1),
        );
        diagnostics.extend(realized.diagnostics);
        daily_returns.extend(realized.daily_returns);

        match drift_weights(&weights, &realized.fund_returns, realized.portfolio_return) {
            Some(drifted) => weights = drifted,
            None => {
                warn!(date = %point.date, "portfolio return of -100%");
                diagnostics.push(Diagnostic::TotalLoss);
            }
        }

        cumulative *= 1.0 + realized.portfolio_return;
        value *= 1.0 + realized.portfolio_return;

        debug!(
            date = %point.date,
            %regime,
            period_return = realized.portfolio_return,
            rebalanced = trigger.is_some(),
            source = ?realized.source,
            "period"
        );

        records.push(BacktestPeriodRecord {
            date: point.date,
            regime,
            confidence: detection.confidence,
            is_sticky: detection.is_sticky,
            weights: held,
            period_return: realized.portfolio_return,
            cumulative_return: cumulative - 1.0,
            portfolio_value: value,
            rebalanced: trigger.is_some(),
            trigger,
            transition_progress,
            data_source: realized.source,
            diagnostics,
        });

        state = state.advance(&detection);
        detections.push(detection);
        previous = Some((point.date, regime));
    }

    let output = SimulationOutput {
        records,
        detections,
        daily_returns,
        transitions,
        initial_investment: config.initial_investment,
    };
    info!(
        periods = output.records.len(),
        rebalances = output.rebalance_count(),
        transitions = output.transitions.len(),
        proxy_periods = output.proxy_periods(),
        "simulation complete"
    );
    Ok(output)
}
