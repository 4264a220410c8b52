//! Application-wide constants
//!
//! Wire-format markers, default endpoints, and the fixed content of the
//! degraded-mode fallback sequence.

use std::time::Duration;

/// Backend endpoint defaults
pub mod backend {
    use super::*;

    /// Used when no base URL is configured
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

    /// Environment variable overriding the configured base URL
    pub const API_URL_ENV: &str = "COMMAND_CENTER_API_URL";

    pub const STREAM_PATH: &str = "/stream";
    pub const HEALTH_PATH: &str = "/health";

    pub const EVENT_STREAM_CONTENT_TYPE: &str = "text/event-stream";

    /// Client-side timeout for a single health probe
    pub const DEFAULT_HEALTH_TIMEOUT: Duration = Duration::from_secs(10);
}

/// Server-sent event framing
pub mod frame {
    /// Prefix of every line that carries an event
    pub const DATA_PREFIX: &str = "data: ";

    /// Payload marking logical end of stream
    pub const DONE_SENTINEL: &str = "[DONE]";
}

/// Health probing
pub mod health {
    /// Seconds between scheduled probes
    pub const DEFAULT_PROBE_INTERVAL_SECS: u64 = 10;
}

/// Session bookkeeping
pub mod session {
    /// Broadcast capacity for session updates
    pub const DEFAULT_BUS_CAPACITY: usize = 1000;

    /// `raw_intent` of the fallback classification keeps this many characters of the query
    pub const RAW_INTENT_MAX_CHARS: usize = 80;
}

/// Content of the degraded-mode fallback sequence
pub mod fallback {
    pub const SECURITY: &str = "AAPL";
    pub const PRICE_HISTORY_TOOL: &str = "get_price_history";
    pub const PRICE_HISTORY_PERIOD: &str = "1mo";
    pub const EARNINGS_SUMMARY_TOOL: &str = "get_earnings_summary";
    pub const RISK_SCORE: f64 = 35.0;
    pub const RISK_LABEL: &str = "Moderate";
}
