//! 网络访问模块：可插拔的网络传输与包裹插件钩子的网络访问门面。
//!
//! Network access.
//!
//! [`NetworkClient`] is the facade strategies call; it runs the fetch-related
//! plugin hooks around a [`Fetcher`], the actual transport.

mod http;
mod network;

pub use http::{HttpFetcher, TransportError};
pub use network::{FetchOptions, NetworkClient};

use crate::types::{Request, Response};
use crate::Result;
use async_trait::async_trait;

/// Performs the network round trip for a request.
///
/// Non-2xx statuses are responses, not errors; only a failure to obtain a
/// response at all is an `Err`.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, request: &Request) -> Result<Response>;

    fn name(&self) -> &'static str {
        "custom"
    }
}
