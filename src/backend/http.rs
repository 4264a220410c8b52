use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{header::ACCEPT, Client};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::constants::backend::{
    DEFAULT_HEALTH_TIMEOUT, EVENT_STREAM_CONTENT_TYPE, HEALTH_PATH, STREAM_PATH,
};
use crate::error::{BackendError, BackendResult};
use crate::events::HealthReport;

use super::traits::{ChunkStream, ThoughtBackend};

/// reqwest-backed client for the agent backend.
#[derive(Clone, Debug)]
pub struct HttpBackend {
    base_url: String,
    client: Client,
    health_timeout: Duration,
}

impl HttpBackend {
    /// # Arguments
    /// * `base_url` - Backend root, e.g. "http://localhost:8000"
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_health_timeout(base_url, DEFAULT_HEALTH_TIMEOUT)
    }

    pub fn with_health_timeout(base_url: impl Into<String>, health_timeout: Duration) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            base_url,
            client: Client::new(),
            health_timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn stream_url(&self, query: &str) -> BackendResult<Url> {
        let endpoint = format!("{}{}", self.base_url, STREAM_PATH);
        Ok(Url::parse_with_params(&endpoint, &[("query", query)])?)
    }

    pub fn health_url(&self) -> BackendResult<Url> {
        Ok(Url::parse(&format!("{}{}", self.base_url, HEALTH_PATH))?)
    }
}

#[async_trait]
impl ThoughtBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn open_stream(&self, query: &str) -> BackendResult<ChunkStream> {
        let url = self.stream_url(query)?;
        info!("📡 [STREAM] Opening {}", url);

        let response = self
            .client
            .get(url)
            .header(ACCEPT, EVENT_STREAM_CONTENT_TYPE)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let reason = status
                .canonical_reason()
                .unwrap_or("Stream failed")
                .to_string();
            warn!("⚠️ [STREAM] Backend returned {}", status);
            return Err(BackendError::Http {
                status: status.as_u16(),
                reason,
            });
        }

        let body = response
            .bytes_stream()
            .map(|chunk| {
                chunk
                    .map(|bytes| bytes.to_vec())
                    .map_err(|e| BackendError::Body(e.to_string()))
            })
            .boxed();
        Ok(body)
    }

    async fn health(&self) -> BackendResult<HealthReport> {
        let url = self.health_url()?;
        let response = self
            .client
            .get(url)
            .timeout(self.health_timeout)
            .send()
            .await?;

        // A response that arrived counts as a round trip even if its body is unusable.
        let status = response.status();
        match response.json::<HealthReport>().await {
            Ok(report) => Ok(report),
            Err(e) => {
                debug!("[HEALTH] Unusable body (status {}): {}", status, e);
                Ok(HealthReport::default())
            }
        }
    }
}
