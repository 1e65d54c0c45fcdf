//! cache-first-fetch: 以缓存优先策略请求 URL 的命令行工具
//!
//! Usage:
//!   cache-first-fetch [--store <name>] [--config <file.yaml>] <url>...
//!
//! Each URL is requested twice through one strategy instance: the first
//! request normally goes to the network, the second is served from the store
//! once the background write has finished.

use anyhow::{bail, Context};
use cache_first::{BackgroundTasks, CacheFirst, Request, StrategyConfig};
use tracing_subscriber::EnvFilter;

struct Args {
    store: Option<String>,
    config: Option<String>,
    urls: Vec<String>,
}

fn parse_args(raw: &[String]) -> anyhow::Result<Args> {
    let mut args = Args {
        store: None,
        config: None,
        urls: Vec::new(),
    };
    let mut iter = raw.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--store" => {
                args.store = Some(iter.next().context("--store needs a value")?.clone());
            }
            "--config" => {
                args.config = Some(iter.next().context("--config needs a value")?.clone());
            }
            "help" | "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            other if other.starts_with("--") => bail!("unknown option: {other}"),
            url => args.urls.push(url.to_string()),
        }
    }
    if args.urls.is_empty() {
        bail!("no URL given");
    }
    Ok(args)
}

fn print_usage() {
    println!(
        r#"cache-first-fetch: 缓存优先请求工具

USAGE:
    cache-first-fetch [OPTIONS] <URL>...

OPTIONS:
    --store <name>          Store name (default: generated runtime name)
    --config <file.yaml>    Strategy configuration file

ENVIRONMENT:
    CACHE_FIRST_STORE_NAME, CACHE_FIRST_FETCH_TIMEOUT_MS,
    CACHE_FIRST_MAX_ENTRIES, CACHE_FIRST_IGNORE_SEARCH
    RUST_LOG                Log filter (e.g. cache_first=debug)"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let raw: Vec<String> = std::env::args().skip(1).collect();
    let args = match parse_args(&raw) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("error: {e}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    let config = match &args.config {
        Some(path) => StrategyConfig::from_yaml_file(path)
            .with_context(|| format!("loading config from {path}"))?,
        None => StrategyConfig::from_env()?,
    };
    let mut builder = CacheFirst::builder().config(&config);
    if let Some(store) = &args.store {
        builder = builder.store_name(store);
    }
    let strategy = builder.build()?;
    let tasks = BackgroundTasks::new();

    for url in &args.urls {
        let request = Request::get(url)?;
        for attempt in 1..=2 {
            let hits_before = strategy.store().stats().hits;
            let response = strategy
                .handle(request.clone(), &tasks)
                .await
                .with_context(|| format!("fetching {url}"))?;
            let status = response.status();
            let body = response.bytes().await?;
            let source = if strategy.store().stats().hits > hits_before {
                "store"
            } else {
                "network"
            };
            println!("[{attempt}] {url} {status} {} bytes from {source}", body.len());
            tasks.drain().await;
        }
    }

    let stats = strategy.store().stats();
    println!(
        "store '{}': hits={} misses={} writes={} skipped={} errors={}",
        strategy.store_name(),
        stats.hits,
        stats.misses,
        stats.writes,
        stats.skipped_writes,
        stats.write_errors
    );
    Ok(())
}
