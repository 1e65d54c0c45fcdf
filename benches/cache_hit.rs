//! Benchmarks for the cache-first request path
//!
//! This benchmark measures:
//! - Store hits (no network) with and without plugins
//! - Misses served by an in-process fetcher, including the background write

use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::sync::Arc;

use cache_first::plugins::{CacheableResponsePlugin, PluginPipeline};
use cache_first::store::{MatchOptions, MemoryStore, StoreClient};
use cache_first::transport::Fetcher;
use cache_first::{BackgroundTasks, CacheFirst, Request, Response};

const PAYLOAD: &[u8] = &[b'x'; 16 * 1024];

struct Static;

#[async_trait]
impl Fetcher for Static {
    async fn fetch(&self, _request: &Request) -> cache_first::Result<Response> {
        Ok(Response::ok(PAYLOAD.to_vec()))
    }
}

fn bench_hit(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("cache_hit");
    group.throughput(Throughput::Bytes(PAYLOAD.len() as u64));

    for (label, with_plugin) in [("no_plugins", false), ("cacheable_plugin", true)] {
        let mut builder = CacheFirst::builder()
            .store_name("bench")
            .fetcher(Arc::new(Static));
        if with_plugin {
            builder = builder.plugin(Arc::new(CacheableResponsePlugin::default()));
        }
        let strategy = builder.build().unwrap();
        let request = Request::get("https://bench.local/app.js").unwrap();
        let tasks = BackgroundTasks::new();
        rt.block_on(async {
            strategy.handle(request.clone(), &tasks).await.unwrap().bytes().await.unwrap();
            tasks.drain().await;
        });

        group.bench_function(label, |b| {
            b.to_async(&rt).iter(|| async {
                let response = strategy.handle(black_box(request.clone()), &tasks).await.unwrap();
                black_box(response.bytes().await.unwrap());
            })
        });
    }
    group.finish();
}

fn bench_miss(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let strategy = CacheFirst::builder()
        .store_name("bench-miss")
        .fetcher(Arc::new(Static))
        .build()
        .unwrap();
    let tasks = BackgroundTasks::new();
    let mut n = 0u64;

    c.bench_function("cache_miss_with_write", |b| {
        b.to_async(&rt).iter(|| {
            n += 1;
            let request = Request::get(&format!("https://bench.local/item/{n}")).unwrap();
            let strategy = &strategy;
            let tasks = &tasks;
            async move {
                let response = strategy.handle(request, tasks).await.unwrap();
                black_box(response.bytes().await.unwrap());
                tasks.drain().await;
            }
        })
    });
}

fn bench_store_match(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = StoreClient::new(Arc::new(MemoryStore::default()));
    let plugins = PluginPipeline::new();
    let request = Request::get("https://bench.local/data.json?page=1").unwrap();
    rt.block_on(store.put("bench", request.clone(), Response::ok(PAYLOAD.to_vec()), &plugins))
        .unwrap();
    let lenient = MatchOptions::new().with_ignore_search(true);

    c.bench_function("store_match_ignore_search", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                store
                    .match_response("bench", &request, &lenient, &plugins)
                    .await
                    .unwrap(),
            )
        })
    });
}

criterion_group!(benches, bench_hit, bench_miss, bench_store_match);
criterion_main!(benches);
