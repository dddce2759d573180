use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::warn;

/// Worst-case wait for a single upstream request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw response handed back by a transport. The status travels with the
/// body so the fetcher can discard non-2xx responses itself.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str) -> Result<HttpResponse>;
}

pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .with_context(|| format!("request to {} failed", url))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .with_context(|| format!("reading response body from {} failed", url))?;
        Ok(HttpResponse { status, body })
    }
}

/// Fans one GET per url out over a bounded permit pool.
pub struct Fetcher {
    transport: Arc<dyn Transport>,
    timeout: Duration,
}

impl std::fmt::Debug for Fetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Fetcher {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self::with_timeout(transport, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(transport: Arc<dyn Transport>, timeout: Duration) -> Self {
        Self { transport, timeout }
    }

    /// Issues every request with at most `max_concurrency` in flight and
    /// returns the bodies of 2xx responses in input order. A failed or
    /// timed out request drops its own body and nothing else; the call
    /// returns once every request has resolved.
    pub async fn fetch_all(&self, urls: &[String], max_concurrency: usize) -> Vec<String> {
        if urls.is_empty() {
            return Vec::new();
        }

        let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
        let requests = urls.iter().map(|url| {
            let semaphore = Arc::clone(&semaphore);
            async move {
                let _permit = semaphore.acquire().await.ok()?;
                match tokio::time::timeout(self.timeout, self.transport.get(url)).await {
                    Ok(Ok(resp)) if resp.is_success() => Some(resp.body),
                    Ok(Ok(resp)) => {
                        warn!("request to {} returned HTTP {} — dropped", url, resp.status);
                        None
                    }
                    Ok(Err(e)) => {
                        warn!("request to {} failed: {:#} — dropped", url, e);
                        None
                    }
                    Err(_) => {
                        warn!("request to {} timed out after {:?} — dropped", url, self.timeout);
                        None
                    }
                }
            }
        });

        join_all(requests).await.into_iter().flatten().collect()
    }
}
