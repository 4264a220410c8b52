//! In-memory backend for driving sessions and probes in tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::{stream, StreamExt};
use tokio::sync::mpsc;

use crate::error::{BackendError, BackendResult};
use crate::events::HealthReport;

use super::traits::{ChunkStream, ThoughtBackend};

pub enum Script {
    /// Deliver these chunks, then close.
    Chunks(Vec<Vec<u8>>),
    /// Deliver chunks as the test sends them; close when the sender drops.
    Channel(mpsc::UnboundedReceiver<BackendResult<Vec<u8>>>),
    /// Fail before any body is available.
    Status(u16, &'static str),
}

#[derive(Clone)]
pub enum HealthScript {
    Report(HealthReport),
    /// Answer with the report after a delay.
    Delayed(Duration, HealthReport),
    Unreachable,
}

#[derive(Default)]
pub struct ScriptedBackend {
    streams: Mutex<HashMap<String, Script>>,
    health: Mutex<Vec<HealthScript>>,
    opened: Mutex<Vec<String>>,
    probes: AtomicUsize,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stream(self, query: &str, script: Script) -> Self {
        self.streams.lock().unwrap().insert(query.to_string(), script);
        self
    }

    pub fn with_body(self, query: &str, body: &str, chunk_size: usize) -> Self {
        let chunks = body
            .as_bytes()
            .chunks(chunk_size.max(1))
            .map(|c| c.to_vec())
            .collect();
        self.with_stream(query, Script::Chunks(chunks))
    }

    /// Health responses, served in order; the last one repeats.
    pub fn with_health(self, scripts: Vec<HealthScript>) -> Self {
        *self.health.lock().unwrap() = scripts;
        self
    }

    pub fn opened(&self) -> Vec<String> {
        self.opened.lock().unwrap().clone()
    }

    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ThoughtBackend for ScriptedBackend {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn open_stream(&self, query: &str) -> BackendResult<ChunkStream> {
        self.opened.lock().unwrap().push(query.to_string());
        let script = self.streams.lock().unwrap().remove(query);
        match script {
            Some(Script::Chunks(chunks)) => Ok(stream::iter(chunks.into_iter().map(Ok)).boxed()),
            Some(Script::Channel(rx)) => Ok(stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|chunk| (chunk, rx))
            })
            .boxed()),
            Some(Script::Status(status, reason)) => Err(BackendError::Http {
                status,
                reason: reason.to_string(),
            }),
            None => Err(BackendError::Http {
                status: 404,
                reason: "Not Found".to_string(),
            }),
        }
    }

    async fn health(&self) -> BackendResult<HealthReport> {
        let n = self.probes.fetch_add(1, Ordering::SeqCst);
        let script = {
            let scripts = self.health.lock().unwrap();
            scripts.get(n).or_else(|| scripts.last()).cloned()
        };
        match script {
            Some(HealthScript::Report(report)) => Ok(report),
            Some(HealthScript::Delayed(delay, report)) => {
                tokio::time::sleep(delay).await;
                Ok(report)
            }
            Some(HealthScript::Unreachable) | None => {
                Err(BackendError::Body("connection refused".to_string()))
            }
        }
    }
}
