//! Status/header based write filter.

use super::base::{HookType, Plugin, WriteContext};
use crate::types::Response;
use crate::{Error, ErrorContext, Result};
use async_trait::async_trait;
use reqwest::StatusCode;

/// Persists only responses with an allowed status and/or header value.
///
/// When both rules are configured a response must satisfy both. Registering
/// this plugin replaces the store's default "200 only" rule, which allows e.g.
/// caching opaque (status 0) or 404 responses on purpose.
#[derive(Debug, Clone)]
pub struct CacheableResponsePlugin {
    statuses: Vec<u16>,
    headers: Vec<(String, String)>,
}

impl CacheableResponsePlugin {
    pub fn new(statuses: Vec<u16>, headers: Vec<(String, String)>) -> Result<Self> {
        if statuses.is_empty() && headers.is_empty() {
            return Err(Error::configuration_with_context(
                "at least one of statuses or headers must be set",
                ErrorContext::new().with_source("cacheable_response_plugin"),
            ));
        }
        Ok(Self { statuses, headers })
    }

    pub fn statuses(statuses: impl IntoIterator<Item = u16>) -> Result<Self> {
        Self::new(statuses.into_iter().collect(), Vec::new())
    }

    pub fn is_cacheable(&self, response: &Response) -> bool {
        let status_ok =
            self.statuses.is_empty() || self.statuses.contains(&response.status().as_u16());
        let headers_ok = self.headers.is_empty()
            || self
                .headers
                .iter()
                .any(|(name, value)| response.header(name) == Some(value.as_str()));
        status_ok && headers_ok
    }
}

#[async_trait]
impl Plugin for CacheableResponsePlugin {
    fn name(&self) -> &str {
        "cacheable_response"
    }

    fn hooks(&self) -> &[HookType] {
        &[HookType::BeforeWrite]
    }

    async fn before_write(
        &self,
        ctx: &WriteContext<'_>,
        response: Response,
    ) -> Result<Option<Response>> {
        if self.is_cacheable(&response) {
            Ok(Some(response))
        } else {
            tracing::debug!(
                url = %ctx.request.url(),
                status = response.status().as_u16(),
                "response not cacheable"
            );
            Ok(None)
        }
    }
}

impl Default for CacheableResponsePlugin {
    fn default() -> Self {
        Self {
            statuses: vec![StatusCode::OK.as_u16()],
            headers: Vec::new(),
        }
    }
}
