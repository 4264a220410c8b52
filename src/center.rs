//! Presentation-facing surface: one stream session plus one health prober
//! over a shared backend.

use std::sync::Arc;

use tokio::sync::{broadcast, watch};
use tracing::info;

use crate::backend::{HttpBackend, ThoughtBackend};
use crate::bus::{EventBus, SessionUpdate};
use crate::config::AppConfig;
use crate::error::ProbeError;
use crate::events::{SystemHealth, ThoughtEvent};
use crate::services::health::HealthProber;
use crate::services::projection::Projection;
use crate::services::session::StreamSession;

#[derive(Clone)]
pub struct CommandCenter {
    session: StreamSession,
    prober: HealthProber,
}

impl CommandCenter {
    pub fn new(backend: Arc<dyn ThoughtBackend>, config: &AppConfig) -> Self {
        let bus = EventBus::new(config.event_bus_capacity);
        Self {
            session: StreamSession::new(backend.clone(), bus),
            prober: HealthProber::new(backend, config.health_interval()),
        }
    }

    /// Command center talking HTTP to `config.api_base_url`.
    pub fn from_config(config: &AppConfig) -> Self {
        let backend = HttpBackend::with_health_timeout(
            config.api_base_url.clone(),
            config.health_timeout(),
        );
        Self::new(Arc::new(backend), config)
    }

    /// Begin periodic health probing.
    pub async fn start(&self) -> Result<(), ProbeError> {
        self.prober.start().await
    }

    /// Stop probing and abandon any background run.
    pub async fn shutdown(&self) {
        self.session.abort();
        self.prober.stop().await;
        info!("👋 Command center shut down");
    }

    pub fn events(&self) -> Vec<ThoughtEvent> {
        self.session.events()
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_streaming()
    }

    pub fn error(&self) -> Option<String> {
        self.session.error()
    }

    pub fn health(&self) -> SystemHealth {
        self.prober.current()
    }

    pub fn projection(&self) -> Projection {
        self.session.projection()
    }

    pub async fn run_query(&self, query: &str) {
        self.session.run_query(query).await
    }

    pub fn spawn_query(&self, query: impl Into<String>) {
        self.session.spawn_query(query)
    }

    pub fn clear_events(&self) {
        self.session.clear_events()
    }

    pub async fn probe_health(&self) -> SystemHealth {
        self.prober.probe().await
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.session.subscribe()
    }

    pub fn subscribe_health(&self) -> watch::Receiver<SystemHealth> {
        self.prober.subscribe()
    }
}
