use super::Fetcher;
use crate::types::{Body, Request, Response};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::TryStreamExt;
use reqwest::Proxy;
use std::env;
use std::time::Duration;

/// Network transport backed by a pooled `reqwest::Client`.
///
/// Response bodies are streamed, not buffered.
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Build a client with production-friendly defaults (env-overridable):
    /// - `CACHE_FIRST_HTTP_TIMEOUT_SECS` (default 30)
    /// - `CACHE_FIRST_HTTP_POOL_MAX_IDLE_PER_HOST` (default 32)
    /// - `CACHE_FIRST_HTTP_POOL_IDLE_TIMEOUT_SECS` (default 90)
    /// - `CACHE_FIRST_PROXY_URL`
    pub fn new() -> Result<Self> {
        let timeout_secs = env_parse::<u64>("CACHE_FIRST_HTTP_TIMEOUT_SECS").unwrap_or(30);

        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .pool_max_idle_per_host(
                env_parse::<usize>("CACHE_FIRST_HTTP_POOL_MAX_IDLE_PER_HOST").unwrap_or(32),
            )
            .pool_idle_timeout(Some(Duration::from_secs(
                env_parse::<u64>("CACHE_FIRST_HTTP_POOL_IDLE_TIMEOUT_SECS").unwrap_or(90),
            )));

        if let Ok(proxy_url) = env::var("CACHE_FIRST_PROXY_URL") {
            if let Ok(proxy) = Proxy::all(&proxy_url) {
                builder = builder.proxy(proxy);
            }
        }

        let client = builder
            .build()
            .map_err(|e| Error::Network(TransportError::Other(e.to_string())))?;

        Ok(Self { client })
    }

    /// Use a caller-configured client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.parse::<T>().ok())
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        let resp = self
            .client
            .request(request.method().clone(), request.url().clone())
            .headers(request.headers().clone())
            .send()
            .await
            .map_err(|e| Error::Network(TransportError::Http(e)))?;

        let status = resp.status();
        let headers = resp.headers().clone();
        let url = resp.url().clone();
        let body = Body::from_stream(
            resp.bytes_stream()
                .map_err(|e| Error::Network(TransportError::Http(e))),
        );
        Ok(Response::from_parts(status, headers, Some(url), body))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
