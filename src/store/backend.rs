//! Store backend implementations.

use super::key::{entry_matches, MatchOptions, StoreKey};
use crate::types::{Body, Request, Response};
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use bytes::Bytes;
use lru::LruCache;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard};
use url::Url;

/// Fully buffered response held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub url: Option<Url>,
    pub body: Bytes,
}

impl StoredResponse {
    /// Read `response` to completion.
    pub async fn read(response: Response) -> Result<Self> {
        let (status, headers, url, body) = response.into_parts();
        Ok(Self {
            status,
            headers,
            url,
            body: body.bytes().await?,
        })
    }

    /// Fresh response over the stored bytes. Each call yields an independent body.
    pub fn to_response(&self) -> Response {
        Response::from_parts(
            self.status,
            self.headers.clone(),
            self.url.clone(),
            Body::from_bytes(self.body.clone()),
        )
    }
}

/// A stored request/response pair.
#[derive(Debug, Clone)]
pub struct StoredEntry {
    pub key: StoreKey,
    /// Request the response was stored for; consulted for `Vary`.
    pub request: Request,
    pub response: StoredResponse,
}

impl StoredEntry {
    pub fn new(request: Request, response: StoredResponse) -> Self {
        Self {
            key: StoreKey::from_request(&request),
            request,
            response,
        }
    }
}

/// Durable keyed persistence of request/response pairs, partitioned by store name.
///
/// Implementations must be safe for concurrent use; callers never lock around them.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    async fn get(
        &self,
        store: &str,
        request: &Request,
        options: &MatchOptions,
    ) -> Result<Option<StoredResponse>>;
    /// Insert or replace the entry for `request`.
    async fn put(&self, store: &str, request: &Request, response: StoredResponse) -> Result<()>;
    async fn delete(&self, store: &str, request: &Request, options: &MatchOptions) -> Result<bool>;
    /// Requests currently stored, most recently used first.
    async fn keys(&self, store: &str) -> Result<Vec<Request>>;
    async fn delete_store(&self, store: &str) -> Result<bool>;
    fn name(&self) -> &'static str;
}

/// In-memory backend with a bounded LRU per store name.
pub struct MemoryStore {
    stores: Mutex<HashMap<String, LruCache<String, StoredEntry>>>,
    max_entries: NonZeroUsize,
}

impl MemoryStore {
    pub const DEFAULT_MAX_ENTRIES: usize = 1024;

    pub fn new(max_entries: usize) -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            max_entries: NonZeroUsize::new(max_entries).unwrap_or(NonZeroUsize::MIN),
        }
    }

    fn stores(&self) -> Result<MutexGuard<'_, HashMap<String, LruCache<String, StoredEntry>>>> {
        self.stores.lock().map_err(|_| {
            Error::store_with_context(
                "memory store poisoned",
                ErrorContext::new().with_source("memory_store"),
            )
        })
    }

    fn find_hash(
        cache: &LruCache<String, StoredEntry>,
        request: &Request,
        options: &MatchOptions,
    ) -> Option<String> {
        let key = StoreKey::from_request(request);
        if let Some(entry) = cache.peek(&key.hash) {
            if entry_matches(entry, request, options) {
                return Some(key.hash);
            }
        }
        if !options.ignore_search && !options.ignore_vary {
            return None;
        }
        cache
            .iter()
            .find(|(_, entry)| entry_matches(entry, request, options))
            .map(|(hash, _)| hash.clone())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX_ENTRIES)
    }
}

#[async_trait]
impl StoreBackend for MemoryStore {
    async fn get(
        &self,
        store: &str,
        request: &Request,
        options: &MatchOptions,
    ) -> Result<Option<StoredResponse>> {
        let mut stores = self.stores()?;
        let Some(cache) = stores.get_mut(store) else {
            return Ok(None);
        };
        let Some(hash) = Self::find_hash(cache, request, options) else {
            return Ok(None);
        };
        Ok(cache.get(&hash).map(|e| e.response.clone()))
    }

    async fn put(&self, store: &str, request: &Request, response: StoredResponse) -> Result<()> {
        let entry = StoredEntry::new(request.clone(), response);
        let mut stores = self.stores()?;
        let cap = self.max_entries;
        stores
            .entry(store.to_string())
            .or_insert_with(|| LruCache::new(cap))
            .put(entry.key.hash.clone(), entry);
        Ok(())
    }

    async fn delete(&self, store: &str, request: &Request, options: &MatchOptions) -> Result<bool> {
        let mut stores = self.stores()?;
        let Some(cache) = stores.get_mut(store) else {
            return Ok(false);
        };
        match Self::find_hash(cache, request, options) {
            Some(hash) => Ok(cache.pop(&hash).is_some()),
            None => Ok(false),
        }
    }

    async fn keys(&self, store: &str) -> Result<Vec<Request>> {
        let stores = self.stores()?;
        Ok(stores
            .get(store)
            .map(|c| c.iter().map(|(_, e)| e.request.clone()).collect())
            .unwrap_or_default())
    }

    async fn delete_store(&self, store: &str) -> Result<bool> {
        Ok(self.stores()?.remove(store).is_some())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Backend that never stores anything.
pub struct NullStore;
impl NullStore {
    pub fn new() -> Self {
        Self
    }
}
impl Default for NullStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreBackend for NullStore {
    async fn get(&self, _: &str, _: &Request, _: &MatchOptions) -> Result<Option<StoredResponse>> {
        Ok(None)
    }
    async fn put(&self, _: &str, _: &Request, _: StoredResponse) -> Result<()> {
        Ok(())
    }
    async fn delete(&self, _: &str, _: &Request, _: &MatchOptions) -> Result<bool> {
        Ok(false)
    }
    async fn keys(&self, _: &str) -> Result<Vec<Request>> {
        Ok(Vec::new())
    }
    async fn delete_store(&self, _: &str) -> Result<bool> {
        Ok(false)
    }
    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stored(body: &'static str) -> StoredResponse {
        StoredResponse {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            url: None,
            body: Bytes::from_static(body.as_bytes()),
        }
    }

    fn req(url: &str) -> Request {
        Request::get(url).unwrap()
    }

    #[tokio::test]
    async fn test_memory_store_partitions_by_name() {
        let store = MemoryStore::default();
        let r = req("https://example.com/app.css");
        store.put("a", &r, stored("body-a")).await.unwrap();

        let opts = MatchOptions::default();
        assert_eq!(store.get("a", &r, &opts).await.unwrap().unwrap().body, "body-a");
        assert!(store.get("b", &r, &opts).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_evicts_least_recently_used() {
        let store = MemoryStore::new(2);
        let opts = MatchOptions::default();
        let (a, b, c) = (req("https://e.com/a"), req("https://e.com/b"), req("https://e.com/c"));
        store.put("s", &a, stored("a")).await.unwrap();
        store.put("s", &b, stored("b")).await.unwrap();
        // Touch `a` so `b` becomes the eviction candidate.
        assert!(store.get("s", &a, &opts).await.unwrap().is_some());
        store.put("s", &c, stored("c")).await.unwrap();

        assert!(store.get("s", &a, &opts).await.unwrap().is_some());
        assert!(store.get("s", &b, &opts).await.unwrap().is_none());
        assert!(store.get("s", &c, &opts).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_memory_store_ignore_search_scans() {
        let store = MemoryStore::default();
        store.put("s", &req("https://e.com/q?page=1"), stored("p1")).await.unwrap();
        let lookup = req("https://e.com/q?page=9");
        assert!(store.get("s", &lookup, &MatchOptions::default()).await.unwrap().is_none());
        let hit = store
            .get("s", &lookup, &MatchOptions::new().with_ignore_search(true))
            .await
            .unwrap();
        assert_eq!(hit.unwrap().body, "p1");
    }

    #[tokio::test]
    async fn test_memory_store_delete_and_keys() {
        let store = MemoryStore::default();
        let r = req("https://e.com/x");
        store.put("s", &r, stored("x")).await.unwrap();
        assert_eq!(store.keys("s").await.unwrap(), vec![r.clone()]);
        assert!(store.delete("s", &r, &MatchOptions::default()).await.unwrap());
        assert!(store.keys("s").await.unwrap().is_empty());
        assert!(store.delete_store("s").await.unwrap());
        assert!(!store.delete_store("s").await.unwrap());
    }

    #[tokio::test]
    async fn test_null_store_never_matches() {
        let store = NullStore::new();
        let r = req("https://e.com/x");
        store.put("s", &r, stored("x")).await.unwrap();
        assert!(store.get("s", &r, &MatchOptions::default()).await.unwrap().is_none());
        assert_eq!(store.name(), "null");
    }

    #[tokio::test]
    async fn test_stored_response_yields_independent_bodies() {
        let s = stored("payload");
        let a = s.to_response();
        let b = s.to_response();
        assert_eq!(a.text().await.unwrap(), "payload");
        assert_eq!(b.text().await.unwrap(), "payload");
    }
}
