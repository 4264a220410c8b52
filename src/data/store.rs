use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;
use uuid::Uuid;

use crate::events::ThoughtEvent;

#[derive(Debug, Default)]
struct SessionState {
    run_id: Option<Uuid>,
    events: Vec<ThoughtEvent>,
    is_streaming: bool,
    error: Option<String>,
}

/// Event log plus the streaming/error flags of the current run.
///
/// Every write that belongs to a run names that run; writes from a run that
/// has since been superseded are refused.
#[derive(Clone, Debug)]
pub struct SessionStore {
    state: Arc<Mutex<SessionState>>,
    current: Arc<watch::Sender<Option<Uuid>>>,
}

impl Default for SessionStore {
    fn default() -> Self {
        let (current, _rx) = watch::channel(None);
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            current: Arc::new(current),
        }
    }
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Start a new run: empty log, no error, streaming.
    pub fn begin_run(&self, run_id: Uuid) {
        let mut state = self.lock();
        state.run_id = Some(run_id);
        state.events = Vec::new();
        state.error = None;
        state.is_streaming = true;
        self.current.send_replace(Some(run_id));
    }

    /// Resolves once `run_id` is no longer the current run.
    pub async fn superseded(&self, run_id: Uuid) {
        let mut rx = self.current.subscribe();
        // The sender is owned by `self`, so the channel cannot close here.
        rx.wait_for(|current| *current != Some(run_id)).await.ok();
    }

    pub fn is_current(&self, run_id: Uuid) -> bool {
        self.lock().run_id == Some(run_id)
    }

    pub fn current_run(&self) -> Option<Uuid> {
        self.lock().run_id
    }

    /// Append on behalf of `run_id`. Returns false if that run is stale.
    pub fn append_for(&self, run_id: Uuid, event: ThoughtEvent) -> bool {
        let mut state = self.lock();
        if state.run_id != Some(run_id) {
            return false;
        }
        state.events.push(event);
        true
    }

    /// Append regardless of run.
    pub fn append(&self, event: ThoughtEvent) {
        self.lock().events.push(event);
    }

    /// Record a failure for `run_id` and append its fallback events in one step.
    pub fn fail_run(&self, run_id: Uuid, message: String, fallback: Vec<ThoughtEvent>) -> bool {
        let mut state = self.lock();
        if state.run_id != Some(run_id) {
            return false;
        }
        state.error = Some(message);
        state.events.extend(fallback);
        true
    }

    /// Clear the streaming flag if `run_id` is still the current run.
    pub fn finish_run(&self, run_id: Uuid) -> bool {
        let mut state = self.lock();
        if state.run_id != Some(run_id) {
            return false;
        }
        state.is_streaming = false;
        true
    }

    /// Empty the log and clear the error. The streaming flag is untouched.
    pub fn clear(&self) {
        let mut state = self.lock();
        state.events = Vec::new();
        state.error = None;
    }

    pub fn events(&self) -> Vec<ThoughtEvent> {
        self.lock().events.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_streaming(&self) -> bool {
        self.lock().is_streaming
    }

    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Run `f` against the log without copying it.
    pub fn with_events<R>(&self, f: impl FnOnce(&[ThoughtEvent]) -> R) -> R {
        f(&self.lock().events)
    }
}
