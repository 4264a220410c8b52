//! Error types for the backend transport and configuration.
//!
//! Neither kind escapes the session or the prober: both are converted into
//! recovered state at those boundaries.

use thiserror::Error;

/// Failures talking to the agent backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status}: {reason}")]
    Http { status: u16, reason: String },

    #[error("Stream body unreadable: {0}")]
    Body(String),

    #[error("Invalid backend URL: {0}")]
    Url(#[from] url::ParseError),
}

/// Failures managing the periodic health probe (never from a probe itself)
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Scheduler error: {0}")]
    Scheduler(#[from] tokio_cron_scheduler::JobSchedulerError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type BackendResult<T> = Result<T, BackendError>;
