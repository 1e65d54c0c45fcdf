//! Store keys and match rules.

use super::backend::StoredEntry;
use crate::types::Request;
use reqwest::header::VARY;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Options applied when looking a request up in a store.
///
/// All flags default to `false`: an exact, unfiltered match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchOptions {
    /// Ignore the query string of both the request and stored URLs.
    pub ignore_search: bool,
    /// Allow non-GET requests to match stored GET entries.
    pub ignore_method: bool,
    /// Skip the `Vary` header comparison.
    pub ignore_vary: bool,
}

impl MatchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ignore_search(mut self, v: bool) -> Self {
        self.ignore_search = v;
        self
    }
    pub fn with_ignore_method(mut self, v: bool) -> Self {
        self.ignore_method = v;
        self
    }
    pub fn with_ignore_vary(mut self, v: bool) -> Self {
        self.ignore_vary = v;
        self
    }
}

/// Backend key derived from a request URL. Fragments never take part.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StoreKey {
    pub hash: String,
    pub url: String,
    pub url_without_search: String,
}

impl StoreKey {
    pub fn from_request(request: &Request) -> Self {
        let mut url = request.url().clone();
        url.set_fragment(None);
        let full = url.to_string();
        url.set_query(None);
        let bare = url.to_string();

        let mut hasher = Sha256::new();
        hasher.update(full.as_bytes());
        let hash: String = hasher.finalize().iter().map(|b| format!("{:02x}", b)).collect();
        Self {
            hash,
            url: full,
            url_without_search: bare,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.hash
    }
}

impl std::fmt::Display for StoreKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.url)
    }
}

/// True when `request` may be answered by `entry` under `options`.
pub fn entry_matches(entry: &StoredEntry, request: &Request, options: &MatchOptions) -> bool {
    if !options.ignore_method && request.method() != Method::GET {
        return false;
    }

    let wanted = StoreKey::from_request(request);
    let url_ok = if options.ignore_search {
        entry.key.url_without_search == wanted.url_without_search
    } else {
        entry.key.url == wanted.url
    };
    if !url_ok {
        return false;
    }

    options.ignore_vary || vary_matches(entry, request)
}

fn vary_matches(entry: &StoredEntry, request: &Request) -> bool {
    for value in entry.response.headers.get_all(VARY) {
        let Ok(value) = value.to_str() else {
            return false;
        };
        for name in value.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            if name == "*" {
                return false;
            }
            if entry.request.header(name) != request.header(name) {
                return false;
            }
        }
    }
    true
}
