//! 类型系统模块：定义请求、响应与可复制的单次消费响应体。
//!
//! # Types Module
//!
//! This module defines the values that flow through a strategy: the immutable
//! [`Request`] used as the store key, the [`Response`] returned to callers and
//! persisted to stores, and the single-consumption [`Body`] stream backing it.
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Request`] | Method, URL and headers of a resource request |
//! | [`Response`] | Status, headers and a single-consumption body |
//! | [`Body`] | Buffered bytes or a byte stream, duplicable with [`Body::tee`] |
//!
//! ## Duplication
//!
//! A response body can be read exactly once. When the same payload must be both
//! returned and persisted, split it first:
//!
//! ```rust
//! use cache_first::types::Response;
//!
//! # tokio_test::block_on(async {
//! let response = Response::ok("payload");
//! let (for_caller, for_store) = response.tee();
//! assert_eq!(for_caller.text().await.unwrap(), "payload");
//! assert_eq!(for_store.text().await.unwrap(), "payload");
//! # });
//! ```

pub mod body;
pub mod request;
pub mod response;

pub use body::Body;
pub use request::Request;
pub use response::Response;
