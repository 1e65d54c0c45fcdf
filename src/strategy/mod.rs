//! 策略模块：决定请求由缓存还是网络响应。
//!
//! Request-fulfillment strategies.
//!
//! A routing layer hands each intercepted request to a [`Strategy`] together
//! with the [`KeepAlive`] of its execution context. Strategies are built once
//! and shared across concurrent requests.

mod cache_first;

pub use cache_first::{CacheFirst, CacheFirstBuilder};

use crate::lifetime::KeepAlive;
use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Resolve `request` to a response or an error. Background work the
    /// strategy starts is registered with `keep_alive`.
    async fn handle(&self, request: Request, keep_alive: &dyn KeepAlive) -> Result<Response>;
}
