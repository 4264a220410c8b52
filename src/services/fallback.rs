//! Degraded-mode content shown when the backend cannot be streamed from.

use serde_json::{json, Map, Value};

use crate::constants::fallback::*;
use crate::constants::session::RAW_INTENT_MAX_CHARS;
use crate::events::{
    AgentId, AnalysisType, ClassifierPayload, Confidence, Direction, SecuritiesTradingStrategy,
    ThoughtEvent,
};

fn args(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

/// The fixed five-event sequence appended after a transport failure.
pub fn fallback_events(query: &str) -> Vec<ThoughtEvent> {
    let raw_intent: String = query.chars().take(RAW_INTENT_MAX_CHARS).collect();

    vec![
        ThoughtEvent::Classification {
            payload: ClassifierPayload {
                analysis_type: AnalysisType::Both,
                security: Some(SECURITY.to_string()),
                sector: None,
                time_horizon: None,
                raw_intent,
            },
        },
        ThoughtEvent::ToolCall {
            agent: AgentId::TechnicalAnalyst,
            tool: PRICE_HISTORY_TOOL.to_string(),
            args: args(json!({"symbol": SECURITY, "period": PRICE_HISTORY_PERIOD})),
        },
        ThoughtEvent::ToolCall {
            agent: AgentId::FundamentalAnalyst,
            tool: EARNINGS_SUMMARY_TOOL.to_string(),
            args: args(json!({"symbol": SECURITY})),
        },
        ThoughtEvent::RiskScore {
            score: RISK_SCORE,
            label: RISK_LABEL.to_string(),
        },
        ThoughtEvent::Strategy {
            payload: SecuritiesTradingStrategy {
                security: Some(SECURITY.to_string()),
                direction: Direction::Buy,
                confidence: Confidence::Medium,
                technical_summary: "Price above 20/50 SMA; volume supportive.".to_string(),
                fundamental_summary: "Earnings growth positive; P/E in range.".to_string(),
                risk_assessment: "Volatility within limit.".to_string(),
                rationale: "Technical and fundamental alignment with acceptable risk.".to_string(),
                conditions: vec!["Hold if price holds above 50 SMA.".to_string()],
                warnings: vec!["Monitor Fed policy.".to_string()],
            },
        },
    ]
}
