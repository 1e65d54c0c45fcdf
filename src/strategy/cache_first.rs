use super::Strategy;
use crate::config::StrategyConfig;
use crate::lifetime::KeepAlive;
use crate::plugins::{Plugin, PluginPipeline};
use crate::store::{resolve_store_name, MatchOptions, MemoryStore, StoreBackend, StoreClient};
use crate::transport::{FetchOptions, Fetcher, HttpFetcher, NetworkClient};
use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Answer from the store when possible, otherwise from the network.
///
/// On a miss the network response is split in two: one copy is returned right
/// away, the other is written to the store by a task registered with the
/// caller's [`KeepAlive`]. The write is never awaited on the response path and
/// its failure never reaches the caller.
///
/// The instance carries no per-request state, so one instance serves any
/// number of concurrent requests.
pub struct CacheFirst {
    store_name: String,
    plugins: Arc<PluginPipeline>,
    store: StoreClient,
    network: NetworkClient,
    match_options: MatchOptions,
    fetch_options: FetchOptions,
}

impl CacheFirst {
    pub fn builder() -> CacheFirstBuilder {
        CacheFirstBuilder::new()
    }

    /// Default store name, no plugins, in-memory store, HTTP transport.
    pub fn new() -> Result<Self> {
        CacheFirstBuilder::new().build()
    }

    pub fn store_name(&self) -> &str {
        &self.store_name
    }

    pub fn plugins(&self) -> &PluginPipeline {
        &self.plugins
    }

    /// Store facade, e.g. for statistics.
    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub async fn handle(&self, request: Request, keep_alive: &dyn KeepAlive) -> Result<Response> {
        let span = info_span!(
            "cache_first",
            request_id = %Uuid::new_v4(),
            url = %request.url(),
            store = %self.store_name,
        );
        self.handle_inner(request, keep_alive).instrument(span).await
    }

    async fn handle_inner(&self, request: Request, keep_alive: &dyn KeepAlive) -> Result<Response> {
        let cached = self
            .store
            .match_response(&self.store_name, &request, &self.match_options, &self.plugins)
            .await?;
        if let Some(response) = cached {
            debug!("served from store");
            return Ok(response);
        }

        debug!("store miss, fetching from network");
        self.get_from_network(request, keep_alive).await
    }

    async fn get_from_network(
        &self,
        request: Request,
        keep_alive: &dyn KeepAlive,
    ) -> Result<Response> {
        let response = self
            .network
            .fetch(request.clone(), &self.fetch_options, &self.plugins)
            .await?;
        let (for_caller, for_store) = response.tee();

        let store = self.store.clone();
        let plugins = self.plugins.clone();
        let store_name = self.store_name.clone();
        let write = async move {
            let url = request.url().clone();
            if let Err(e) = store.put(&store_name, request, for_store, &plugins).await {
                warn!(store = %store_name, url = %url, error = %e, "background store write failed");
            }
        };
        keep_alive.keep_alive(Box::pin(write.in_current_span()));

        Ok(for_caller)
    }
}

#[async_trait]
impl Strategy for CacheFirst {
    fn name(&self) -> &'static str {
        "cache_first"
    }

    async fn handle(&self, request: Request, keep_alive: &dyn KeepAlive) -> Result<Response> {
        CacheFirst::handle(self, request, keep_alive).await
    }
}

/// Construction-time configuration for [`CacheFirst`]. Every setting is optional.
#[derive(Default)]
pub struct CacheFirstBuilder {
    store_name: Option<String>,
    plugins: Vec<Arc<dyn Plugin>>,
    store_backend: Option<Arc<dyn StoreBackend>>,
    store_client: Option<StoreClient>,
    fetcher: Option<Arc<dyn Fetcher>>,
    match_options: MatchOptions,
    fetch_options: FetchOptions,
    max_entries: Option<usize>,
}

impl CacheFirstBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store name; resolved once in [`build`](Self::build), defaulting to
    /// [`crate::store::default_store_name`].
    pub fn store_name(mut self, name: impl Into<String>) -> Self {
        self.store_name = Some(name.into());
        self
    }

    /// Append a plugin. Plugins run in the order they are added.
    pub fn plugin(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn plugins(mut self, plugins: impl IntoIterator<Item = Arc<dyn Plugin>>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    pub fn store_backend(mut self, backend: Arc<dyn StoreBackend>) -> Self {
        self.store_backend = Some(backend);
        self
    }

    /// Share a store facade (and its statistics) with other strategies.
    /// Takes precedence over [`store_backend`](Self::store_backend).
    pub fn store_client(mut self, client: StoreClient) -> Self {
        self.store_client = Some(client);
        self
    }

    pub fn fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn match_options(mut self, options: MatchOptions) -> Self {
        self.match_options = options;
        self
    }

    pub fn fetch_options(mut self, options: FetchOptions) -> Self {
        self.fetch_options = options;
        self
    }

    /// Apply a loaded configuration. Explicit builder calls made afterwards win.
    pub fn config(mut self, config: &StrategyConfig) -> Self {
        if let Some(name) = &config.store_name {
            self.store_name = Some(name.clone());
        }
        self.match_options = config.match_options;
        self.fetch_options = config.fetch_options();
        self.max_entries = config.max_entries;
        self
    }

    pub fn build(self) -> Result<CacheFirst> {
        let store_name = resolve_store_name(self.store_name.as_deref());

        let store = match (self.store_client, self.store_backend) {
            (Some(client), _) => client,
            (None, Some(backend)) => StoreClient::new(backend),
            (None, None) => StoreClient::new(Arc::new(MemoryStore::new(
                self.max_entries.unwrap_or(MemoryStore::DEFAULT_MAX_ENTRIES),
            ))),
        };
        let fetcher: Arc<dyn Fetcher> = match self.fetcher {
            Some(f) => f,
            None => Arc::new(HttpFetcher::new()?),
        };
        let plugins = PluginPipeline::from(self.plugins);

        info!(
            store = store_name.as_str(),
            backend = store.backend_name(),
            fetcher = fetcher.name(),
            plugins = plugins.len(),
            "cache-first strategy ready"
        );

        Ok(CacheFirst {
            store_name,
            plugins: Arc::new(plugins),
            store,
            network: NetworkClient::new(fetcher),
            match_options: self.match_options,
            fetch_options: self.fetch_options,
        })
    }
}
