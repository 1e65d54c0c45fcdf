//! Base plugin types.

use crate::store::{MatchOptions, StoredResponse};
use crate::types::{Request, Response};
use crate::{Error, Result};
use async_trait::async_trait;
use std::fmt;

/// Lifecycle points a plugin can hook into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookType {
    BeforeMatch,
    AfterMatch,
    BeforeFetch,
    AfterFetch,
    FetchFailed,
    BeforeWrite,
    AfterWrite,
}

impl HookType {
    pub fn as_str(&self) -> &'static str {
        match self {
            HookType::BeforeMatch => "before_match",
            HookType::AfterMatch => "after_match",
            HookType::BeforeFetch => "before_fetch",
            HookType::AfterFetch => "after_fetch",
            HookType::FetchFailed => "fetch_failed",
            HookType::BeforeWrite => "before_write",
            HookType::AfterWrite => "after_write",
        }
    }
}

impl fmt::Display for HookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Store lookup being performed.
#[derive(Debug, Clone, Copy)]
pub struct MatchContext<'a> {
    pub store_name: &'a str,
    pub request: &'a Request,
    pub options: &'a MatchOptions,
}

/// A network fetch that did not produce a response.
#[derive(Debug, Clone, Copy)]
pub struct FetchFailure<'a> {
    /// Request as handed to the network facade, before any rewrite.
    pub original_request: &'a Request,
    /// Request after every `before_fetch` hook ran.
    pub request: &'a Request,
    pub error: &'a Error,
}

/// Store write about to happen.
#[derive(Debug, Clone, Copy)]
pub struct WriteContext<'a> {
    pub store_name: &'a str,
    pub request: &'a Request,
}

/// Store write that completed.
#[derive(Debug, Clone, Copy)]
pub struct StoreUpdate<'a> {
    pub store_name: &'a str,
    pub request: &'a Request,
    /// Entry replaced by this write, if any.
    pub old_response: Option<&'a StoredResponse>,
    pub new_response: &'a StoredResponse,
}

/// Extension object invoked around store lookups, network fetches and store writes.
///
/// Every hook has a pass-through default. The pipeline only calls the hooks a
/// plugin lists in [`Plugin::hooks`], in registration order, awaiting each one
/// before moving on. Returning an error from any hook aborts the operation the
/// hook was wrapping.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    /// Hooks this plugin implements.
    fn hooks(&self) -> &[HookType];

    /// Supply a response without consulting the store. The first `Some` wins.
    async fn before_match(&self, _ctx: &MatchContext<'_>) -> Result<Option<Response>> {
        Ok(None)
    }

    /// Inspect, replace or veto (`None`) the matched response.
    async fn after_match(
        &self,
        _ctx: &MatchContext<'_>,
        cached: Option<Response>,
    ) -> Result<Option<Response>> {
        Ok(cached)
    }

    /// Rewrite the outbound request.
    async fn before_fetch(&self, request: Request) -> Result<Request> {
        Ok(request)
    }

    /// Transform the network response, or reject it by returning an error.
    async fn after_fetch(&self, _request: &Request, response: Response) -> Result<Response> {
        Ok(response)
    }

    async fn fetch_failed(&self, _failure: &FetchFailure<'_>) -> Result<()> {
        Ok(())
    }

    /// Transform what gets persisted, or veto the write with `None`.
    async fn before_write(
        &self,
        _ctx: &WriteContext<'_>,
        response: Response,
    ) -> Result<Option<Response>> {
        Ok(Some(response))
    }

    async fn after_write(&self, _update: &StoreUpdate<'_>) -> Result<()> {
        Ok(())
    }
}
