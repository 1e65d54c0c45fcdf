//! Ordered plugin pipeline.

use super::base::{FetchFailure, HookType, MatchContext, Plugin, StoreUpdate, WriteContext};
use crate::types::{Request, Response};
use crate::Result;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Plugins in registration order. The order never changes after construction
/// and is the same for every hook point.
#[derive(Clone, Default)]
pub struct PluginPipeline {
    plugins: Vec<Arc<dyn Plugin>>,
}

impl PluginPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, plugin: Arc<dyn Plugin>) -> Self {
        self.plugins.push(plugin);
        self
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub fn plugins(&self) -> &[Arc<dyn Plugin>] {
        &self.plugins
    }

    /// True if at least one plugin declares `hook`.
    pub fn has_hook(&self, hook: HookType) -> bool {
        self.plugins.iter().any(|p| p.hooks().contains(&hook))
    }

    fn implementing(&self, hook: HookType) -> impl Iterator<Item = &Arc<dyn Plugin>> {
        self.plugins.iter().filter(move |p| {
            let found = p.hooks().contains(&hook);
            if found {
                debug!(plugin = p.name(), hook = hook.as_str(), "invoking plugin hook");
            }
            found
        })
    }

    pub async fn before_match(&self, ctx: &MatchContext<'_>) -> Result<Option<Response>> {
        for p in self.implementing(HookType::BeforeMatch) {
            if let Some(resp) = p.before_match(ctx).await? {
                return Ok(Some(resp));
            }
        }
        Ok(None)
    }

    pub async fn after_match(
        &self,
        ctx: &MatchContext<'_>,
        mut cached: Option<Response>,
    ) -> Result<Option<Response>> {
        for p in self.implementing(HookType::AfterMatch) {
            cached = p.after_match(ctx, cached).await?;
        }
        Ok(cached)
    }

    pub async fn before_fetch(&self, mut request: Request) -> Result<Request> {
        for p in self.implementing(HookType::BeforeFetch) {
            request = p.before_fetch(request).await?;
        }
        Ok(request)
    }

    pub async fn after_fetch(&self, request: &Request, mut response: Response) -> Result<Response> {
        for p in self.implementing(HookType::AfterFetch) {
            response = p.after_fetch(request, response).await?;
        }
        Ok(response)
    }

    pub async fn fetch_failed(&self, failure: &FetchFailure<'_>) -> Result<()> {
        for p in self.implementing(HookType::FetchFailed) {
            p.fetch_failed(failure).await?;
        }
        Ok(())
    }

    /// Runs `before_write` hooks until one vetoes. `None` means do not persist.
    pub async fn before_write(
        &self,
        ctx: &WriteContext<'_>,
        response: Response,
    ) -> Result<Option<Response>> {
        let mut current = response;
        for p in self.implementing(HookType::BeforeWrite) {
            match p.before_write(ctx, current).await? {
                Some(next) => current = next,
                None => {
                    debug!(plugin = p.name(), url = %ctx.request.url(), "write vetoed by plugin");
                    return Ok(None);
                }
            }
        }
        Ok(Some(current))
    }

    pub async fn after_write(&self, update: &StoreUpdate<'_>) -> Result<()> {
        for p in self.implementing(HookType::AfterWrite) {
            p.after_write(update).await?;
        }
        Ok(())
    }
}

impl From<Vec<Arc<dyn Plugin>>> for PluginPipeline {
    fn from(plugins: Vec<Arc<dyn Plugin>>) -> Self {
        Self { plugins }
    }
}

impl fmt::Debug for PluginPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}
