//! 插件系统：在缓存匹配、网络请求与缓存写入前后按注册顺序调用的钩子。
//!
//! Plugin system.
//!
//! Plugins add cross-cutting behavior (response transformation, write filtering,
//! analytics) around the three operations a strategy performs, without the
//! strategy knowing about them.
//!
//! | Hook | Invoked by | Effect |
//! |------|------------|--------|
//! | `before_match` | store facade | may supply a response and skip the lookup |
//! | `after_match` | store facade | may transform or veto the matched response |
//! | `before_fetch` | network facade | may rewrite the outbound request |
//! | `after_fetch` | network facade | may transform the response or fail the fetch |
//! | `fetch_failed` | network facade | notified before a fetch error propagates |
//! | `before_write` | store facade | may transform or veto what gets persisted |
//! | `after_write` | store facade | notified with the old and new stored entries |

mod base;
mod cacheable;
mod pipeline;

pub use base::{FetchFailure, HookType, MatchContext, Plugin, StoreUpdate, WriteContext};
pub use cacheable::CacheableResponsePlugin;
pub use pipeline::PluginPipeline;
