//! Strategy configuration.
//!
//! Every field is optional; unset fields fall back to the documented defaults
//! (generated store name, exact matching, no fetch timeout, in-memory store of
//! [`MemoryStore::DEFAULT_MAX_ENTRIES`](crate::store::MemoryStore::DEFAULT_MAX_ENTRIES)).

use crate::store::MatchOptions;
use crate::transport::FetchOptions;
use crate::{Error, ErrorContext, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyConfig {
    pub store_name: Option<String>,
    pub match_options: MatchOptions,
    pub fetch_timeout_ms: Option<u64>,
    /// Capacity of the default in-memory store, per store name.
    pub max_entries: Option<usize>,
}

impl StrategyConfig {
    /// Load from the environment:
    /// - `CACHE_FIRST_STORE_NAME`
    /// - `CACHE_FIRST_FETCH_TIMEOUT_MS`
    /// - `CACHE_FIRST_MAX_ENTRIES`
    /// - `CACHE_FIRST_IGNORE_SEARCH` (`1`/`true`)
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self {
            store_name: lookup("CACHE_FIRST_STORE_NAME").filter(|s| !s.trim().is_empty()),
            fetch_timeout_ms: parse_var(&lookup, "CACHE_FIRST_FETCH_TIMEOUT_MS")?,
            max_entries: parse_var(&lookup, "CACHE_FIRST_MAX_ENTRIES")?,
            ..Self::default()
        };
        if let Some(v) = lookup("CACHE_FIRST_IGNORE_SEARCH") {
            cfg.match_options.ignore_search = matches!(v.trim(), "1" | "true" | "TRUE" | "yes");
        }
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&content)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_entries == Some(0) {
            return Err(Error::configuration_with_context(
                "max_entries must be at least 1",
                ErrorContext::new().with_source("strategy_config"),
            ));
        }
        Ok(())
    }

    pub fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: self.fetch_timeout_ms.map(Duration::from_millis),
        }
    }
}

fn parse_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<T>().map(Some).map_err(|e| {
            Error::configuration_with_context(
                format!("invalid value for {}: {}", key, e),
                ErrorContext::new()
                    .with_details(format!("got '{}'", raw))
                    .with_source("strategy_config"),
            )
        }),
    }
}
