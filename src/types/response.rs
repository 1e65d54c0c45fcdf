use super::body::Body;
use crate::Result;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use url::Url;

/// A response with a single-consumption body.
///
/// `Response` is deliberately not `Clone`: use [`Response::tee`] to obtain two
/// independent copies before reading.
#[derive(Debug)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    url: Option<Url>,
    body: Body,
}

impl Response {
    pub fn new(status: StatusCode, body: impl Into<Body>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            url: None,
            body: body.into(),
        }
    }

    /// 200 OK with the given body.
    pub fn ok(body: impl Into<Body>) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn from_parts(
        status: StatusCode,
        headers: HeaderMap,
        url: Option<Url>,
        body: Body,
    ) -> Self {
        Self {
            status,
            headers,
            url,
            body,
        }
    }

    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Url>, Body) {
        (self.status, self.headers, self.url, self.body)
    }

    pub fn with_header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn with_url(mut self, url: Url) -> Self {
        self.url = Some(url);
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Final URL the payload was served from, when known.
    pub fn url(&self) -> Option<&Url> {
        self.url.as_ref()
    }

    pub fn body(&self) -> &Body {
        &self.body
    }

    pub fn into_body(self) -> Body {
        self.body
    }

    /// Split into two responses with identical metadata and independent bodies.
    pub fn tee(self) -> (Response, Response) {
        let (left, right) = self.body.tee();
        let copy = Response {
            status: self.status,
            headers: self.headers.clone(),
            url: self.url.clone(),
            body: left,
        };
        let original = Response {
            status: self.status,
            headers: self.headers,
            url: self.url,
            body: right,
        };
        (copy, original)
    }

    pub async fn bytes(self) -> Result<Bytes> {
        self.body.bytes().await
    }

    pub async fn text(self) -> Result<String> {
        let bytes = self.body.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(self) -> Result<T> {
        let bytes = self.body.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}
