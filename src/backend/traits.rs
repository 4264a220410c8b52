use async_trait::async_trait;
use futures_util::stream::BoxStream;

use crate::error::BackendResult;
use crate::events::HealthReport;

/// Raw response body of a query stream, chunked however the transport delivered it.
pub type ChunkStream = BoxStream<'static, BackendResult<Vec<u8>>>;

/// The service running the agent pipeline.
#[async_trait]
pub trait ThoughtBackend: Send + Sync {
    fn name(&self) -> &'static str;

    /// Open the event stream for `query`. Errors here mean no body is available.
    async fn open_stream(&self, query: &str) -> BackendResult<ChunkStream>;

    /// One round trip to the status endpoint.
    async fn health(&self) -> BackendResult<HealthReport>;
}
