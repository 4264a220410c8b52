use crate::events::ThoughtEvent;
use tokio::sync::broadcast;
use uuid::Uuid;

/// Notifications a presentation layer can render from, in the order the
/// session state changed.
#[derive(Clone, Debug)]
pub enum SessionUpdate {
    RunStarted { run_id: Uuid, query: String },
    Event { run_id: Uuid, event: ThoughtEvent },
    RunFailed { run_id: Uuid, message: String },
    RunFinished { run_id: Uuid },
    Cleared,
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SessionUpdate>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionUpdate> {
        self.tx.subscribe()
    }

    pub fn publish(
        &self,
        update: SessionUpdate,
    ) -> Result<usize, broadcast::error::SendError<SessionUpdate>> {
        self.tx.send(update)
    }
}
