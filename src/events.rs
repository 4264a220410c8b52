//! Event vocabulary emitted by the agent pipeline and the snapshot types
//! derived from it.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    Orchestrator,
    Classifier,
    TechnicalAnalyst,
    FundamentalAnalyst,
    RiskAnalyst,
}

impl AgentId {
    /// Every agent, in pipeline order.
    pub const ALL: [AgentId; 5] = [
        AgentId::Orchestrator,
        AgentId::Classifier,
        AgentId::TechnicalAnalyst,
        AgentId::FundamentalAnalyst,
        AgentId::RiskAnalyst,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::Orchestrator => "orchestrator",
            AgentId::Classifier => "classifier",
            AgentId::TechnicalAnalyst => "technical_analyst",
            AgentId::FundamentalAnalyst => "fundamental_analyst",
            AgentId::RiskAnalyst => "risk_analyst",
        }
    }
}

/// Which analysis path(s) the classifier picked for a query.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisType {
    Technical,
    Fundamental,
    Both,
    RiskOnly,
    #[serde(other)]
    Unknown,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClassifierPayload {
    pub analysis_type: AnalysisType,
    pub security: Option<String>,
    pub sector: Option<String>,
    pub time_horizon: Option<String>,
    pub raw_intent: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Buy,
    Sell,
    Hold,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Confidence {
    Low,
    Medium,
    High,
}

/// Synthesized output of the whole pipeline; terminal payload of a `strategy` event.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecuritiesTradingStrategy {
    pub security: Option<String>,
    pub direction: Direction,
    pub confidence: Confidence,
    pub technical_summary: String,
    pub fundamental_summary: String,
    pub risk_assessment: String,
    pub rationale: String,
    #[serde(default)]
    pub conditions: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// One frame of the reasoning trace.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ThoughtEvent {
    Classification {
        payload: ClassifierPayload,
    },
    AnalystStart {
        agent: AgentId,
        instruction: String,
    },
    Thought {
        agent: AgentId,
        step: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        payload: Option<Value>,
    },
    ToolCall {
        agent: AgentId,
        tool: String,
        args: Map<String, Value>,
    },
    ToolResult {
        agent: AgentId,
        tool: String,
        result: String,
    },
    AnalystEnd {
        agent: AgentId,
        summary: String,
    },
    Strategy {
        payload: SecuritiesTradingStrategy,
    },
    RiskScore {
        score: f64,
        label: String,
    },
}

impl ThoughtEvent {
    /// Wire tag of the event.
    pub fn kind(&self) -> &'static str {
        match self {
            ThoughtEvent::Classification { .. } => "classification",
            ThoughtEvent::AnalystStart { .. } => "analyst_start",
            ThoughtEvent::Thought { .. } => "thought",
            ThoughtEvent::ToolCall { .. } => "tool_call",
            ThoughtEvent::ToolResult { .. } => "tool_result",
            ThoughtEvent::AnalystEnd { .. } => "analyst_end",
            ThoughtEvent::Strategy { .. } => "strategy",
            ThoughtEvent::RiskScore { .. } => "risk_score",
        }
    }

    pub fn agent(&self) -> Option<AgentId> {
        match self {
            ThoughtEvent::AnalystStart { agent, .. }
            | ThoughtEvent::Thought { agent, .. }
            | ThoughtEvent::ToolCall { agent, .. }
            | ThoughtEvent::ToolResult { agent, .. }
            | ThoughtEvent::AnalystEnd { agent, .. } => Some(*agent),
            ThoughtEvent::Classification { .. }
            | ThoughtEvent::Strategy { .. }
            | ThoughtEvent::RiskScore { .. } => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskSnapshot {
    pub score: f64,
    pub label: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentState {
    Idle,
    Running,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentStatus {
    pub id: AgentId,
    pub status: AgentState,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub last_activity_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

/// Latest probe result. Always replaced as a whole.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemHealth {
    pub api_latency_ms: Option<u64>,
    pub agents: Vec<AgentStatus>,
    pub registry_healthy: bool,
}

impl SystemHealth {
    /// Snapshot for a probe that never got a response.
    pub fn unreachable() -> Self {
        Self::default()
    }
}

/// Body of `GET /health`. Unknown fields are ignored.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct HealthReport {
    #[serde(default, deserialize_with = "skip_bad_agents")]
    pub agents: Vec<AgentStatus>,
    #[serde(default)]
    pub registry_healthy: bool,
}

/// Timestamps without an offset are read as UTC; unparseable ones as absent.
fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        s.parse::<DateTime<Utc>>()
            .or_else(|_| s.parse::<NaiveDateTime>().map(|naive| naive.and_utc()))
            .map_err(|e| debug!("[HEALTH] Ignoring lastActivityAt {:?}: {}", s, e))
            .ok()
    }))
}

/// One undecodable agent entry drops that entry, not the whole report.
fn skip_bad_agents<'de, D>(deserializer: D) -> Result<Vec<AgentStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<AgentStatus>(entry) {
            Ok(status) => Some(status),
            Err(e) => {
                debug!("[HEALTH] Skipping agent entry: {}", e);
                None
            }
        })
        .collect())
}
