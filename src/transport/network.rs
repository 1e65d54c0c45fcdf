use super::Fetcher;
use crate::plugins::{FetchFailure, PluginPipeline};
use crate::types::{Request, Response};
use crate::{Error, ErrorContext, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// Per-strategy options for network fetches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchOptions {
    /// Bound on the time until response headers arrive; the body may keep streaming.
    pub timeout: Option<Duration>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Network access facade: a [`Fetcher`] wrapped in the fetch-related plugin hooks.
#[derive(Clone)]
pub struct NetworkClient {
    fetcher: Arc<dyn Fetcher>,
}

impl NetworkClient {
    pub fn new(fetcher: Arc<dyn Fetcher>) -> Self {
        Self { fetcher }
    }

    pub fn fetcher_name(&self) -> &'static str {
        self.fetcher.name()
    }

    /// Fetch `request` from the network.
    ///
    /// `before_fetch` hooks rewrite the request, `after_fetch` hooks see the
    /// response. If the transport or an `after_fetch` hook fails, `fetch_failed`
    /// hooks are notified and the original error is returned, even when a
    /// notification hook itself fails.
    pub async fn fetch(
        &self,
        request: Request,
        options: &FetchOptions,
        plugins: &PluginPipeline,
    ) -> Result<Response> {
        let original = request.clone();
        let effective = plugins.before_fetch(request).await?;

        let start = Instant::now();
        let outcome = match self.transport(&effective, options).await {
            Ok(response) => plugins.after_fetch(&effective, response).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(response) => {
                info!(
                    url = %effective.url(),
                    http_status = response.status().as_u16(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    fetcher = self.fetcher.name(),
                    "network fetch completed"
                );
                Ok(response)
            }
            Err(error) => {
                warn!(
                    url = %effective.url(),
                    duration_ms = start.elapsed().as_millis() as u64,
                    error = %error,
                    "network fetch failed"
                );
                let failure = FetchFailure {
                    original_request: &original,
                    request: &effective,
                    error: &error,
                };
                if let Err(hook_error) = plugins.fetch_failed(&failure).await {
                    warn!(
                        url = %effective.url(),
                        error = %hook_error,
                        "fetch_failed hook errored; returning the fetch error"
                    );
                }
                Err(error)
            }
        }
    }

    async fn transport(&self, request: &Request, options: &FetchOptions) -> Result<Response> {
        match options.timeout {
            Some(limit) => tokio::time::timeout(limit, self.fetcher.fetch(request))
                .await
                .map_err(|_| Error::Timeout {
                    timeout_ms: limit.as_millis() as u64,
                    context: ErrorContext::new()
                        .with_url(request.url().as_str())
                        .with_source("network_client"),
                })?,
            None => self.fetcher.fetch(request).await,
        }
    }
}
