//! Thought Stream - streaming ingestion of a multi-agent trading pipeline's
//! reasoning trace
//!
//! This library turns the backend's server-sent event stream into an ordered
//! event log, tracks backend health, and projects the latest strategy and
//! risk score for presentation.

pub mod backend;
pub mod bus;
pub mod center;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod events;
pub mod services;

// Re-export commonly used types
pub use bus::{EventBus, SessionUpdate};
pub use center::CommandCenter;
pub use config::AppConfig;
pub use events::{RiskSnapshot, SecuritiesTradingStrategy, SystemHealth, ThoughtEvent};
pub use services::projection::{project, Projection};

#[cfg(test)]
mod bus_tests;
