//! "Most recent wins" view over the event log.

use crate::events::{RiskSnapshot, SecuritiesTradingStrategy, ThoughtEvent};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Projection {
    pub strategy: Option<SecuritiesTradingStrategy>,
    pub risk: Option<RiskSnapshot>,
}

/// Latest strategy and latest risk score, each found independently by
/// scanning backward from the newest event.
pub fn project(events: &[ThoughtEvent]) -> Projection {
    let mut strategy = None;
    let mut risk = None;

    for event in events.iter().rev() {
        match event {
            ThoughtEvent::Strategy { payload } if strategy.is_none() => {
                strategy = Some(payload.clone());
            }
            ThoughtEvent::RiskScore { score, label } if risk.is_none() => {
                risk = Some(RiskSnapshot {
                    score: *score,
                    label: label.clone(),
                });
            }
            _ => {}
        }
        if strategy.is_some() && risk.is_some() {
            break;
        }
    }

    Projection { strategy, risk }
}

pub fn current_strategy(events: &[ThoughtEvent]) -> Option<SecuritiesTradingStrategy> {
    project(events).strategy
}

pub fn current_risk_score(events: &[ThoughtEvent]) -> Option<RiskSnapshot> {
    project(events).risk
}
