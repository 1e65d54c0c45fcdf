//! # cache-first
//!
//! 缓存优先的请求策略：先查本地存储，未命中时请求网络，并在后台写回存储，全程支持插件钩子。
//!
//! Cache-first request strategy with a pluggable hook pipeline.
//!
//! ## Overview
//!
//! [`CacheFirst`] answers a request from a named store when a stored response
//! matches. On a miss it fetches from the network, returns the response to the
//! caller immediately and persists an independent copy in the background. The
//! write is registered with the caller's [`KeepAlive`] so the hosting context
//! keeps running until it completes, while the response path never waits for it.
//!
//! Plugins observe and transform each step: matching, fetching and writing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cache_first::{BackgroundTasks, CacheFirst};
//! use cache_first::plugins::CacheableResponsePlugin;
//! use cache_first::types::Request;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> cache_first::Result<()> {
//!     let strategy = CacheFirst::builder()
//!         .store_name("assets-v1")
//!         .plugin(Arc::new(CacheableResponsePlugin::statuses([0, 200])?))
//!         .build()?;
//!
//!     let tasks = BackgroundTasks::new();
//!     let request = Request::get("https://example.com/styles/app.css")?;
//!     let response = strategy.handle(request, &tasks).await?;
//!     println!("{} {} bytes", response.status(), response.bytes().await?.len());
//!
//!     tasks.drain().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Module Organization
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`strategy`] | The [`Strategy`] trait and the cache-first strategy |
//! | [`plugins`] | Hook types, the plugin trait and ordered hook execution |
//! | [`store`] | Named store backends and the store access facade |
//! | [`transport`] | Network fetchers and the network access facade |
//! | [`lifetime`] | Registration of background work with the execution context |
//! | [`types`] | Request, response and single-consumption body types |
//! | [`config`] | Strategy configuration from the environment or YAML |

pub mod config;
pub mod lifetime;
pub mod plugins;
pub mod store;
pub mod strategy;
pub mod transport;
pub mod types;

pub use config::StrategyConfig;
pub use lifetime::{BackgroundTasks, KeepAlive};
pub use strategy::{CacheFirst, CacheFirstBuilder, Strategy};
pub use types::{Body, Request, Response};

use futures::Stream;
use std::pin::Pin;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// A unified pinned, boxed stream that emits `Result<T>`
pub type BoxStream<'a, T> = Pin<Box<dyn Stream<Item = Result<T>> + Send + 'a>>;

/// Error type for the library
pub mod error;
pub use error::{Error, ErrorContext};
