//! Drives one query's event stream into the session store.

use std::sync::{Arc, Mutex};

use futures_util::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::backend::ThoughtBackend;
use crate::bus::{EventBus, SessionUpdate};
use crate::data::frame::decode_stream;
use crate::data::store::SessionStore;
use crate::error::BackendResult;
use crate::events::ThoughtEvent;
use crate::services::fallback::fallback_events;
use crate::services::projection::{project, Projection};

/// Clears the streaming flag of its run when dropped, including when the
/// driving future is cancelled mid-read.
struct RunGuard {
    store: SessionStore,
    bus: EventBus,
    run_id: Uuid,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        if self.store.finish_run(self.run_id) {
            self.bus
                .publish(SessionUpdate::RunFinished { run_id: self.run_id })
                .ok();
        }
    }
}

#[derive(Clone)]
pub struct StreamSession {
    backend: Arc<dyn ThoughtBackend>,
    store: SessionStore,
    bus: EventBus,
    task: Arc<Mutex<Option<JoinHandle<()>>>>,
}

impl StreamSession {
    pub fn new(backend: Arc<dyn ThoughtBackend>, bus: EventBus) -> Self {
        Self {
            backend,
            store: SessionStore::new(),
            bus,
            task: Arc::new(Mutex::new(None)),
        }
    }

    pub fn events(&self) -> Vec<ThoughtEvent> {
        self.store.events()
    }

    pub fn is_streaming(&self) -> bool {
        self.store.is_streaming()
    }

    pub fn error(&self) -> Option<String> {
        self.store.error()
    }

    pub fn run_id(&self) -> Option<Uuid> {
        self.store.current_run()
    }

    pub fn projection(&self) -> Projection {
        self.store.with_events(project)
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SessionUpdate> {
        self.bus.subscribe()
    }

    /// Append outside of any stream, e.g. from a presentation layer.
    pub fn append_event(&self, event: ThoughtEvent) {
        self.store.append(event.clone());
        if let Some(run_id) = self.store.current_run() {
            self.bus.publish(SessionUpdate::Event { run_id, event }).ok();
        }
    }

    /// Empty the log and clear the error. Streaming state is left alone.
    pub fn clear_events(&self) {
        self.store.clear();
        self.bus.publish(SessionUpdate::Cleared).ok();
    }

    /// Run `query` to completion on the current task.
    ///
    /// Never fails: transport errors become the recorded error plus the
    /// fallback sequence. A run superseded by a newer one stops writing,
    /// drops its stream, and returns without waiting for more data.
    pub async fn run_query(&self, query: &str) {
        let guard = self.begin(query);
        self.execute(guard, query).await;
    }

    /// Start `query` on a background task, aborting any run started this way before.
    ///
    /// The log is reset before this returns.
    pub fn spawn_query(&self, query: impl Into<String>) {
        let query = query.into();
        let mut task = self.task.lock().unwrap_or_else(|p| p.into_inner());
        if let Some(previous) = task.take() {
            previous.abort();
        }

        let guard = self.begin(&query);
        let session = self.clone();
        *task = Some(tokio::spawn(async move {
            session.execute(guard, &query).await;
        }));
    }

    fn begin(&self, query: &str) -> RunGuard {
        let run_id = Uuid::new_v4();
        self.store.begin_run(run_id);
        self.bus
            .publish(SessionUpdate::RunStarted {
                run_id,
                query: query.to_string(),
            })
            .ok();
        info!("🚀 [STREAM] Run {} started", run_id);

        RunGuard {
            store: self.store.clone(),
            bus: self.bus.clone(),
            run_id,
        }
    }

    async fn execute(&self, guard: RunGuard, query: &str) {
        let run_id = guard.run_id;
        if let Err(e) = self.drive(run_id, query).await {
            let message = e.to_string();
            warn!("⚠️ [STREAM] Run {} failed: {}", run_id, message);
            if self
                .store
                .fail_run(run_id, message.clone(), fallback_events(query))
            {
                self.bus
                    .publish(SessionUpdate::RunFailed { run_id, message })
                    .ok();
            }
        }
        drop(guard);
    }

    async fn drive(&self, run_id: Uuid, query: &str) -> BackendResult<()> {
        let chunks = tokio::select! {
            biased;
            _ = self.store.superseded(run_id) => {
                debug!("[STREAM] Run {} superseded before the stream opened", run_id);
                return Ok(());
            }
            opened = self.backend.open_stream(query) => opened?,
        };
        let mut events = Box::pin(decode_stream(chunks));
        let mut appended = 0usize;

        loop {
            let next = tokio::select! {
                biased;
                _ = self.store.superseded(run_id) => None,
                item = events.next() => Some(item),
            };
            let Some(item) = next else {
                debug!("[STREAM] Run {} superseded, abandoning stream", run_id);
                return Ok(());
            };
            let Some(item) = item else {
                break;
            };
            let event = item?;
            if !self.store.append_for(run_id, event.clone()) {
                debug!("[STREAM] Run {} superseded, abandoning stream", run_id);
                return Ok(());
            }
            appended += 1;
            self.bus.publish(SessionUpdate::Event { run_id, event }).ok();
        }

        info!("✅ [STREAM] Run {} complete ({} events)", run_id, appended);
        Ok(())
    }

    /// Abort the background run, if any.
    pub fn abort(&self) {
        let previous = self.task.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(handle) = previous {
            handle.abort();
        }
    }

    /// Wait for the background run started by [`spawn_query`](Self::spawn_query).
    pub async fn join(&self) {
        let handle = self.task.lock().unwrap_or_else(|p| p.into_inner()).take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                if !e.is_cancelled() {
                    warn!("⚠️ [STREAM] Background run panicked: {}", e);
                }
            }
        }
    }
}
