//! 存储模块：按名称分区的请求/响应持久化，以及包裹插件钩子的存储访问门面。
//!
//! # Store Module
//!
//! Durable, keyed persistence of request/response pairs (the "cache" of
//! cache-first), partitioned by store name.
//!
//! ## Key Components
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`StoreClient`] | Store access facade: match/put wrapped in plugin hooks, with statistics |
//! | [`StoreBackend`] | Trait for implementing custom store backends |
//! | [`MemoryStore`] | In-memory backend with a bounded LRU per store |
//! | [`NullStore`] | No-op backend, never matches |
//! | [`MatchOptions`] | Search/method/Vary relaxations for lookups |
//! | [`resolve_store_name`] | Store name resolution with a runtime-wide default |
//!
//! ## Example
//!
//! ```rust
//! use cache_first::plugins::PluginPipeline;
//! use cache_first::store::{MatchOptions, MemoryStore, StoreClient};
//! use cache_first::types::{Request, Response};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let store = StoreClient::new(Arc::new(MemoryStore::new(100)));
//! let plugins = PluginPipeline::new();
//! let request = Request::get("https://example.com/app.css").unwrap();
//!
//! store.put("assets", request.clone(), Response::ok("body{}"), &plugins).await.unwrap();
//! let hit = store
//!     .match_response("assets", &request, &MatchOptions::default(), &plugins)
//!     .await
//!     .unwrap();
//! assert!(hit.is_some());
//! # });
//! ```

mod backend;
mod client;
mod key;
mod names;

pub use backend::{MemoryStore, NullStore, StoreBackend, StoredEntry, StoredResponse};
pub use client::{StoreClient, StoreStats};
pub use key::{entry_matches, MatchOptions, StoreKey};
pub use names::{
    default_store_name, resolve_store_name, set_store_name_details, store_name_details,
    StoreNameDetails,
};
