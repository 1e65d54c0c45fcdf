//! 生命周期延长：登记在响应返回后仍需完成的后台任务。
//!
//! Lifetime extension for background work.
//!
//! A strategy hands work that must finish after the response was delivered
//! (the store write) to a [`KeepAlive`] supplied by the caller's execution
//! context. The context, not the request path, owns awaiting it.

use futures::future::BoxFuture;
use std::sync::{Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Registration point for background work the hosting context must outlive.
pub trait KeepAlive: Send + Sync {
    /// Take ownership of `task`; it must be driven to completion even though
    /// nobody awaits its result.
    fn keep_alive(&self, task: BoxFuture<'static, ()>);
}

/// Tokio-backed [`KeepAlive`]: spawns each task and tracks it until [`drain`](Self::drain).
///
/// Must be used from within a tokio runtime.
#[derive(Default)]
pub struct BackgroundTasks {
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handles(&self) -> MutexGuard<'_, Vec<JoinHandle<()>>> {
        self.handles.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Tasks registered and not yet finished.
    pub fn pending(&self) -> usize {
        self.handles().iter().filter(|h| !h.is_finished()).count()
    }

    /// Wait for every registered task, including ones registered while draining.
    ///
    /// A panicking task is logged and does not interrupt the drain.
    pub async fn drain(&self) {
        loop {
            let batch = std::mem::take(&mut *self.handles());
            if batch.is_empty() {
                return;
            }
            debug!(tasks = batch.len(), "draining background tasks");
            for handle in batch {
                if let Err(e) = handle.await {
                    warn!(error = %e, "background task did not complete");
                }
            }
        }
    }
}

impl KeepAlive for BackgroundTasks {
    fn keep_alive(&self, task: BoxFuture<'static, ()>) {
        let handle = tokio::spawn(task);
        let mut handles = self.handles();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }
}
