//! Test doubles shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use cache_first::plugins::{
    FetchFailure, HookType, MatchContext, Plugin, StoreUpdate, WriteContext,
};
use cache_first::store::{MatchOptions, MemoryStore, StoreBackend, StoredResponse};
use cache_first::transport::Fetcher;
use cache_first::types::Body;
use cache_first::{Error, ErrorContext, Request, Response, Result};
use reqwest::header::HeaderValue;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, Notify};

/// Canned network: path -> (status, body). Unknown paths answer 404.
#[derive(Default)]
pub struct FakeNetwork {
    routes: Mutex<HashMap<String, (u16, &'static str)>>,
    calls: AtomicUsize,
    offline: std::sync::atomic::AtomicBool,
    chunked: bool,
}

impl FakeNetwork {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Bodies are delivered as a stream of small chunks instead of one buffer.
    pub fn chunked() -> Arc<Self> {
        Arc::new(Self {
            chunked: true,
            ..Self::default()
        })
    }

    pub fn route(self: &Arc<Self>, path: &str, status: u16, body: &'static str) -> Arc<Self> {
        self.routes
            .lock()
            .unwrap()
            .insert(path.to_string(), (status, body));
        self.clone()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Fetcher for FakeNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(Error::network("connection refused"));
        }
        let (status, body) = self
            .routes
            .lock()
            .unwrap()
            .get(request.url().path())
            .copied()
            .unwrap_or((404, "not found"));
        let body = if self.chunked {
            let chunks: Vec<Result<Bytes>> = body
                .as_bytes()
                .chunks(3)
                .map(|c| Ok(Bytes::copy_from_slice(c)))
                .collect();
            Body::from_stream(tokio_stream::iter(chunks))
        } else {
            Body::from(body)
        };
        Ok(
            Response::new(StatusCode::from_u16(status).unwrap(), body)
                .with_url(request.url().clone())
                .with_header("content-type", HeaderValue::from_static("text/plain")),
        )
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

/// Memory store that records every put and can hold puts until released.
pub struct RecordingStore {
    inner: MemoryStore,
    puts: Mutex<Vec<(String, String)>>,
    gate: tokio::sync::Mutex<Option<oneshot::Receiver<()>>>,
    put_started: Notify,
    fail_puts: bool,
    gets: AtomicUsize,
    fail_gets: bool,
}

impl RecordingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::build(None, false))
    }

    /// Every lookup fails with a store error.
    pub fn unreadable() -> Arc<Self> {
        Arc::new(Self {
            fail_gets: true,
            ..Self::build(None, false)
        })
    }

    /// Every put waits until the returned sender fires (or is dropped).
    pub fn gated() -> (Arc<Self>, oneshot::Sender<()>) {
        let (tx, rx) = oneshot::channel();
        (Arc::new(Self::build(Some(rx), false)), tx)
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self::build(None, true))
    }

    fn build(gate: Option<oneshot::Receiver<()>>, fail_puts: bool) -> Self {
        Self {
            inner: MemoryStore::default(),
            puts: Mutex::new(Vec::new()),
            gate: tokio::sync::Mutex::new(gate),
            put_started: Notify::new(),
            fail_puts,
            gets: AtomicUsize::new(0),
            fail_gets: false,
        }
    }

    /// (store name, url) of every completed put, in order.
    pub fn puts(&self) -> Vec<(String, String)> {
        self.puts.lock().unwrap().clone()
    }

    /// Backend lookups made so far.
    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub async fn wait_put_started(&self) {
        self.put_started.notified().await;
    }
}

#[async_trait]
impl StoreBackend for RecordingStore {
    async fn get(
        &self,
        store: &str,
        request: &Request,
        options: &MatchOptions,
    ) -> Result<Option<StoredResponse>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_gets {
            return Err(Error::store_with_context("disk gone", ErrorContext::new()));
        }
        self.inner.get(store, request, options).await
    }

    async fn put(&self, store: &str, request: &Request, response: StoredResponse) -> Result<()> {
        self.put_started.notify_one();
        if let Some(gate) = self.gate.lock().await.take() {
            let _ = gate.await;
        }
        if self.fail_puts {
            return Err(Error::store_with_context("quota exceeded", ErrorContext::new()));
        }
        self.inner.put(store, request, response).await?;
        self.puts
            .lock()
            .unwrap()
            .push((store.to_string(), request.url().to_string()));
        Ok(())
    }

    async fn delete(&self, store: &str, request: &Request, options: &MatchOptions) -> Result<bool> {
        self.inner.delete(store, request, options).await
    }

    async fn keys(&self, store: &str) -> Result<Vec<Request>> {
        self.inner.keys(store).await
    }

    async fn delete_store(&self, store: &str) -> Result<bool> {
        self.inner.delete_store(store).await
    }

    fn name(&self) -> &'static str {
        "recording"
    }
}

pub type Journal = Arc<Mutex<Vec<String>>>;

/// Declares every hook and appends `<name>:<hook>` to a shared journal.
pub struct JournalPlugin {
    name: String,
    journal: Journal,
}

impl JournalPlugin {
    pub fn new(name: &str, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            name: name.to_string(),
            journal: journal.clone(),
        })
    }

    fn note(&self, hook: HookType) {
        self.journal
            .lock()
            .unwrap()
            .push(format!("{}:{}", self.name, hook));
    }
}

#[async_trait]
impl Plugin for JournalPlugin {
    fn name(&self) -> &str {
        &self.name
    }

    fn hooks(&self) -> &[HookType] {
        &[
            HookType::BeforeMatch,
            HookType::AfterMatch,
            HookType::BeforeFetch,
            HookType::AfterFetch,
            HookType::FetchFailed,
            HookType::BeforeWrite,
            HookType::AfterWrite,
        ]
    }

    async fn before_match(&self, _ctx: &MatchContext<'_>) -> Result<Option<Response>> {
        self.note(HookType::BeforeMatch);
        Ok(None)
    }

    async fn after_match(
        &self,
        _ctx: &MatchContext<'_>,
        cached: Option<Response>,
    ) -> Result<Option<Response>> {
        self.note(HookType::AfterMatch);
        Ok(cached)
    }

    async fn before_fetch(&self, request: Request) -> Result<Request> {
        self.note(HookType::BeforeFetch);
        Ok(request)
    }

    async fn after_fetch(&self, _request: &Request, response: Response) -> Result<Response> {
        self.note(HookType::AfterFetch);
        Ok(response)
    }

    async fn fetch_failed(&self, _failure: &FetchFailure<'_>) -> Result<()> {
        self.note(HookType::FetchFailed);
        Ok(())
    }

    async fn before_write(
        &self,
        _ctx: &WriteContext<'_>,
        response: Response,
    ) -> Result<Option<Response>> {
        self.note(HookType::BeforeWrite);
        Ok(Some(response))
    }

    async fn after_write(&self, _update: &StoreUpdate<'_>) -> Result<()> {
        self.note(HookType::AfterWrite);
        Ok(())
    }
}

/// Answers every lookup itself with a fixed body.
pub struct OfflinePage;

#[async_trait]
impl Plugin for OfflinePage {
    fn name(&self) -> &str {
        "offline_page"
    }

    fn hooks(&self) -> &[HookType] {
        &[HookType::BeforeMatch]
    }

    async fn before_match(&self, _ctx: &MatchContext<'_>) -> Result<Option<Response>> {
        Ok(Some(Response::ok("offline page")))
    }
}

pub fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}
