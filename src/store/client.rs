//! Store access facade.

use super::backend::{StoreBackend, StoredResponse};
use super::key::MatchOptions;
use crate::plugins::{HookType, MatchContext, PluginPipeline, StoreUpdate, WriteContext};
use crate::types::{Request, Response};
use crate::{Error, ErrorContext, Result};
use reqwest::{Method, StatusCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    pub hits: u64,
    pub misses: u64,
    pub writes: u64,
    /// Writes skipped because no plugin (or the default rule) allowed them.
    pub skipped_writes: u64,
    pub write_errors: u64,
}

impl StoreStats {
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Default)]
struct AtomicStats {
    hits: AtomicU64,
    misses: AtomicU64,
    writes: AtomicU64,
    skipped_writes: AtomicU64,
    write_errors: AtomicU64,
}

impl AtomicStats {
    fn to_stats(&self) -> StoreStats {
        StoreStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            skipped_writes: self.skipped_writes.load(Ordering::Relaxed),
            write_errors: self.write_errors.load(Ordering::Relaxed),
        }
    }
}

/// Store lookups and writes wrapped in the plugin pipeline.
#[derive(Clone)]
pub struct StoreClient {
    backend: Arc<dyn StoreBackend>,
    stats: Arc<AtomicStats>,
}

impl StoreClient {
    pub fn new(backend: Arc<dyn StoreBackend>) -> Self {
        Self {
            backend,
            stats: Arc::new(AtomicStats::default()),
        }
    }

    /// Look `request` up in `store_name`.
    ///
    /// A `before_match` hook supplying a response skips the backend; the result
    /// then flows through every `after_match` hook either way.
    pub async fn match_response(
        &self,
        store_name: &str,
        request: &Request,
        options: &MatchOptions,
        plugins: &PluginPipeline,
    ) -> Result<Option<Response>> {
        let ctx = MatchContext {
            store_name,
            request,
            options,
        };
        let found = match plugins.before_match(&ctx).await? {
            Some(synthetic) => Some(synthetic),
            None => self
                .backend
                .get(store_name, request, options)
                .await?
                .map(|stored| stored.to_response()),
        };
        let result = plugins.after_match(&ctx, found).await?;

        if result.is_some() {
            self.stats.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.misses.fetch_add(1, Ordering::Relaxed);
        }
        debug!(
            store = store_name,
            url = %request.url(),
            hit = result.is_some(),
            "store match"
        );
        Ok(result)
    }

    /// Persist `response` for `request` in `store_name`.
    ///
    /// Returns `Ok(false)` when the write was vetoed. Without any `before_write`
    /// plugin only 200 responses are persisted.
    pub async fn put(
        &self,
        store_name: &str,
        request: Request,
        response: Response,
        plugins: &PluginPipeline,
    ) -> Result<bool> {
        let outcome = self.put_inner(store_name, &request, response, plugins).await;
        match &outcome {
            Ok(true) => self.stats.writes.fetch_add(1, Ordering::Relaxed),
            Ok(false) => self.stats.skipped_writes.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.stats.write_errors.fetch_add(1, Ordering::Relaxed),
        };
        outcome
    }

    async fn put_inner(
        &self,
        store_name: &str,
        request: &Request,
        response: Response,
        plugins: &PluginPipeline,
    ) -> Result<bool> {
        if request.method() != Method::GET {
            return Err(Error::store_with_context(
                format!("attempt to store a {} request", request.method()),
                ErrorContext::new()
                    .with_url(request.url().as_str())
                    .with_source("store_client"),
            ));
        }

        let ctx = WriteContext {
            store_name,
            request,
        };
        let accepted = if plugins.has_hook(HookType::BeforeWrite) {
            plugins.before_write(&ctx, response).await?
        } else if response.status() == StatusCode::OK {
            Some(response)
        } else {
            debug!(
                url = %request.url(),
                status = response.status().as_u16(),
                "skipping write of non-200 response"
            );
            None
        };
        let Some(response) = accepted else {
            return Ok(false);
        };

        let stored = StoredResponse::read(response).await?;
        let old_response = if plugins.has_hook(HookType::AfterWrite) {
            self.backend
                .get(store_name, request, &MatchOptions::default())
                .await?
        } else {
            None
        };

        self.backend.put(store_name, request, stored.clone()).await?;
        debug!(
            store = store_name,
            url = %request.url(),
            bytes = stored.body.len(),
            "stored response"
        );

        plugins
            .after_write(&StoreUpdate {
                store_name,
                request,
                old_response: old_response.as_ref(),
                new_response: &stored,
            })
            .await?;
        Ok(true)
    }

    pub async fn delete(
        &self,
        store_name: &str,
        request: &Request,
        options: &MatchOptions,
    ) -> Result<bool> {
        self.backend.delete(store_name, request, options).await
    }

    pub async fn keys(&self, store_name: &str) -> Result<Vec<Request>> {
        self.backend.keys(store_name).await
    }

    pub fn stats(&self) -> StoreStats {
        self.stats.to_stats()
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugins::Plugin;
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn client() -> StoreClient {
        StoreClient::new(Arc::new(MemoryStore::default()))
    }

    fn req(url: &str) -> Request {
        Request::get(url).unwrap()
    }

    #[tokio::test]
    async fn test_put_then_match() {
        let store = client();
        let plugins = PluginPipeline::new();
        let r = req("https://example.com/data.json");
        assert!(store.put("s", r.clone(), Response::ok("{}"), &plugins).await.unwrap());

        let hit = store
            .match_response("s", &r, &MatchOptions::default(), &plugins)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(hit.text().await.unwrap(), "{}");
        let stats = store.stats();
        assert_eq!((stats.hits, stats.writes), (1, 1));
    }

    #[tokio::test]
    async fn test_default_rule_skips_non_200() {
        let store = client();
        let plugins = PluginPipeline::new();
        let r = req("https://example.com/missing");
        let stored = store
            .put("s", r.clone(), Response::new(StatusCode::NOT_FOUND, ""), &plugins)
            .await
            .unwrap();
        assert!(!stored);
        assert!(store.keys("s").await.unwrap().is_empty());
        assert_eq!(store.stats().skipped_writes, 1);
    }

    #[tokio::test]
    async fn test_non_get_put_is_rejected() {
        let store = client();
        let r = req("https://example.com/form").with_method(Method::POST);
        let err = store
            .put("s", r, Response::ok("x"), &PluginPipeline::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Store { .. }));
        assert_eq!(store.stats().write_errors, 1);
    }

    struct UpdateWatcher {
        seen: Mutex<Vec<(Option<String>, String)>>,
    }

    #[async_trait]
    impl Plugin for UpdateWatcher {
        fn name(&self) -> &str {
            "update_watcher"
        }
        fn hooks(&self) -> &[HookType] {
            &[HookType::AfterWrite]
        }
        async fn after_write(&self, update: &StoreUpdate<'_>) -> Result<()> {
            let old = update
                .old_response
                .map(|o| String::from_utf8_lossy(&o.body).into_owned());
            let new = String::from_utf8_lossy(&update.new_response.body).into_owned();
            self.seen.lock().unwrap().push((old, new));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_after_write_sees_previous_entry() {
        let store = client();
        let watcher = Arc::new(UpdateWatcher {
            seen: Mutex::new(Vec::new()),
        });
        let plugins = PluginPipeline::new().with(watcher.clone());
        let r = req("https://example.com/app.js");

        store.put("s", r.clone(), Response::ok("v1"), &plugins).await.unwrap();
        store.put("s", r.clone(), Response::ok("v2"), &plugins).await.unwrap();

        let seen = watcher.seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![(None, "v1".to_string()), (Some("v1".to_string()), "v2".to_string())]
        );
    }

    struct Veto;

    #[async_trait]
    impl Plugin for Veto {
        fn name(&self) -> &str {
            "veto"
        }
        fn hooks(&self) -> &[HookType] {
            &[HookType::AfterMatch]
        }
        async fn after_match(
            &self,
            _ctx: &MatchContext<'_>,
            _cached: Option<Response>,
        ) -> Result<Option<Response>> {
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_after_match_can_veto() {
        let store = client();
        let r = req("https://example.com/stale");
        store
            .put("s", r.clone(), Response::ok("old"), &PluginPipeline::new())
            .await
            .unwrap();
        let plugins = PluginPipeline::new().with(Arc::new(Veto));
        let hit = store
            .match_response("s", &r, &MatchOptions::default(), &plugins)
            .await
            .unwrap();
        assert!(hit.is_none());
        assert_eq!(store.stats().misses, 1);
    }
}
