use crate::{Error, ErrorContext, Result};
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::Method;
use url::Url;

/// Immutable description of a resource to retrieve.
///
/// The method and URL form the identity used for store lookups; headers take
/// part only when a stored response declares `Vary`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    url: Url,
    headers: HeaderMap,
}

impl Request {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
        }
    }

    /// Parse `url` and build a GET request for it.
    pub fn get(url: &str) -> Result<Self> {
        let parsed = Url::parse(url).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid request URL: {}", e),
                ErrorContext::new().with_url(url).with_source("request"),
            )
        })?;
        Ok(Self::new(Method::GET, parsed))
    }

    pub fn with_method(mut self, method: Method) -> Self {
        self.method = method;
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = url;
        self
    }

    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Header value as text, if present and valid UTF-8.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}
