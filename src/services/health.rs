//! Periodic health probe of the agent backend.
//! Publishes a fresh `SystemHealth` snapshot after every round trip.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{watch, Mutex};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{debug, info, warn};

use crate::backend::ThoughtBackend;
use crate::error::ProbeError;
use crate::events::SystemHealth;

#[derive(Clone)]
pub struct HealthProber {
    backend: Arc<dyn ThoughtBackend>,
    interval: Duration,
    tx: Arc<watch::Sender<SystemHealth>>,
    scheduler: Arc<Mutex<Option<JobScheduler>>>,
}

impl HealthProber {
    /// # Arguments
    /// * `backend` - Service exposing the status endpoint
    /// * `interval` - Time between scheduled probes after the first one
    pub fn new(backend: Arc<dyn ThoughtBackend>, interval: Duration) -> Self {
        let (tx, _rx) = watch::channel(SystemHealth::default());
        Self {
            backend,
            interval,
            tx: Arc::new(tx),
            scheduler: Arc::new(Mutex::new(None)),
        }
    }

    pub fn current(&self) -> SystemHealth {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SystemHealth> {
        self.tx.subscribe()
    }

    /// One round trip. Replaces the whole snapshot and never fails.
    pub async fn probe(&self) -> SystemHealth {
        let health = Self::measure(self.backend.as_ref()).await;
        self.tx.send_replace(health.clone());
        health
    }

    async fn measure(backend: &dyn ThoughtBackend) -> SystemHealth {
        let start = Instant::now();
        match backend.health().await {
            Ok(report) => {
                let latency_ms = (start.elapsed().as_secs_f64() * 1000.0).round() as u64;
                debug!(
                    "[HEALTH] {} ms, registry healthy: {}, {} agents",
                    latency_ms,
                    report.registry_healthy,
                    report.agents.len()
                );
                SystemHealth {
                    api_latency_ms: Some(latency_ms),
                    agents: report.agents,
                    registry_healthy: report.registry_healthy,
                }
            }
            Err(e) => {
                warn!("⚠️ [HEALTH] Probe of {} backend failed: {}", backend.name(), e);
                SystemHealth::unreachable()
            }
        }
    }

    /// Probe once now, then every `interval` until [`stop`](Self::stop).
    /// Calling it while already running does nothing.
    pub async fn start(&self) -> Result<(), ProbeError> {
        {
            let mut slot = self.scheduler.lock().await;
            if slot.is_some() {
                return Ok(());
            }

            let scheduler = JobScheduler::new().await?;
            let prober = self.clone();
            let job = Job::new_repeated_async(self.interval, move |_uuid, _l| {
                let prober = prober.clone();
                Box::pin(async move {
                    prober.probe().await;
                })
            })?;

            scheduler.add(job).await?;
            scheduler.start().await?;
            *slot = Some(scheduler);
        }

        info!(
            "🔔 [HEALTH] Probe scheduled every {}s",
            self.interval.as_secs_f64()
        );
        // Outside the lock so a slow backend does not hold up stop().
        self.probe().await;
        Ok(())
    }

    pub async fn stop(&self) {
        let scheduler = self.scheduler.lock().await.take();
        if let Some(mut scheduler) = scheduler {
            match scheduler.shutdown().await {
                Ok(()) => info!("🔕 [HEALTH] Probe schedule stopped"),
                Err(e) => warn!("⚠️ [HEALTH] Failed to stop probe schedule: {}", e),
            }
        }
    }

    pub async fn is_running(&self) -> bool {
        self.scheduler.lock().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scripted::{HealthScript, ScriptedBackend};
    use crate::events::{AgentId, AgentState, AgentStatus, HealthReport};

    fn healthy_report() -> HealthReport {
        HealthReport {
            agents: AgentId::ALL
                .iter()
                .map(|id| AgentStatus {
                    id: *id,
                    status: AgentState::Idle,
                    last_activity_at: None,
                    latency_ms: None,
                })
                .collect(),
            registry_healthy: true,
        }
    }

    fn prober(scripts: Vec<HealthScript>) -> (HealthProber, Arc<ScriptedBackend>) {
        let backend = Arc::new(ScriptedBackend::new().with_health(scripts));
        let prober = HealthProber::new(backend.clone(), Duration::from_secs(10));
        (prober, backend)
    }

    #[tokio::test]
    async fn test_initial_snapshot_is_unknown() {
        let (prober, _) = prober(vec![]);
        let health = prober.current();
        assert_eq!(health.api_latency_ms, None);
        assert!(health.agents.is_empty());
        assert!(!health.registry_healthy);
    }

    #[tokio::test]
    async fn test_probe_success_replaces_snapshot() {
        let (prober, _) = prober(vec![HealthScript::Report(healthy_report())]);
        let health = prober.probe().await;

        assert!(health.api_latency_ms.is_some());
        assert_eq!(health.agents.len(), 5);
        assert!(health.registry_healthy);
        assert_eq!(prober.current(), health);
    }

    #[tokio::test]
    async fn test_failed_probe_degrades_regardless_of_prior() {
        let (prober, _) = prober(vec![
            HealthScript::Report(healthy_report()),
            HealthScript::Unreachable,
        ]);
        assert!(prober.probe().await.registry_healthy);

        let health = prober.probe().await;
        assert_eq!(health.api_latency_ms, None);
        assert!(!health.registry_healthy);
        assert!(health.agents.is_empty());
    }

    #[tokio::test]
    async fn test_probe_recovers_after_failure() {
        let (prober, _) = prober(vec![
            HealthScript::Unreachable,
            HealthScript::Report(healthy_report()),
        ]);
        assert!(!prober.probe().await.registry_healthy);
        assert!(prober.probe().await.registry_healthy);
    }

    #[tokio::test]
    async fn test_empty_report_defaults() {
        let (prober, _) = prober(vec![HealthScript::Report(HealthReport::default())]);
        let health = prober.probe().await;
        assert!(health.api_latency_ms.is_some());
        assert!(health.agents.is_empty());
        assert!(!health.registry_healthy);
    }

    #[tokio::test]
    async fn test_subscribers_see_updates() {
        let (prober, _) = prober(vec![HealthScript::Report(healthy_report())]);
        let mut rx = prober.subscribe();
        prober.probe().await;
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().registry_healthy);
    }

    #[tokio::test]
    async fn test_start_probes_immediately_and_is_idempotent() {
        let (prober, backend) = prober(vec![HealthScript::Report(healthy_report())]);
        prober.start().await.unwrap();

        assert!(prober.is_running().await);
        assert_eq!(backend.probe_count(), 1);
        assert!(prober.current().registry_healthy);

        prober.start().await.unwrap();
        assert_eq!(backend.probe_count(), 1);

        prober.stop().await;
        assert!(!prober.is_running().await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_scheduled_probes_repeat() {
        let backend = Arc::new(
            ScriptedBackend::new().with_health(vec![HealthScript::Report(healthy_report())]),
        );
        let prober = HealthProber::new(backend.clone(), Duration::from_secs(1));
        prober.start().await.unwrap();

        tokio::time::sleep(Duration::from_millis(2500)).await;
        prober.stop().await;

        assert!(backend.probe_count() >= 2);
    }

    #[tokio::test]
    async fn test_slow_first_probe_does_not_block_stop() {
        let (prober, backend) = prober(vec![HealthScript::Delayed(
            Duration::from_secs(30),
            healthy_report(),
        )]);
        let starting = prober.clone();
        let start = tokio::spawn(async move { starting.start().await });

        tokio::time::timeout(Duration::from_secs(2), async {
            while backend.probe_count() == 0 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        let running = tokio::time::timeout(Duration::from_millis(500), prober.is_running())
            .await
            .unwrap();
        assert!(running);
        tokio::time::timeout(Duration::from_millis(500), prober.stop())
            .await
            .unwrap();
        assert!(!prober.is_running().await);

        start.abort();
    }
}
