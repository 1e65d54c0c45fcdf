//! Store name resolution.

use once_cell::sync::Lazy;
use std::sync::RwLock;

/// Segments of the runtime-wide default store name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreNameDetails {
    pub prefix: String,
    pub runtime: String,
    pub suffix: Option<String>,
}

impl Default for StoreNameDetails {
    fn default() -> Self {
        Self {
            prefix: "cache-first".to_string(),
            runtime: "runtime".to_string(),
            suffix: None,
        }
    }
}

impl StoreNameDetails {
    /// `prefix-runtime[-suffix]`, skipping empty segments.
    pub fn canonical_name(&self) -> String {
        [
            self.prefix.as_str(),
            self.runtime.as_str(),
            self.suffix.as_deref().unwrap_or(""),
        ]
        .iter()
        .filter(|s| !s.is_empty())
        .copied()
        .collect::<Vec<_>>()
        .join("-")
    }
}

static DETAILS: Lazy<RwLock<StoreNameDetails>> =
    Lazy::new(|| RwLock::new(StoreNameDetails::default()));

/// Override the default naming for strategies constructed from now on.
///
/// Strategies resolve their name once at construction, so existing instances
/// keep the name they started with.
pub fn set_store_name_details(details: StoreNameDetails) {
    *DETAILS.write().unwrap_or_else(|e| e.into_inner()) = details;
}

pub fn store_name_details() -> StoreNameDetails {
    DETAILS.read().unwrap_or_else(|e| e.into_inner()).clone()
}

pub fn default_store_name() -> String {
    store_name_details().canonical_name()
}

/// Caller-supplied name if non-empty, otherwise the runtime-wide default.
pub fn resolve_store_name(name: Option<&str>) -> String {
    match name {
        Some(n) if !n.is_empty() => n.to_string(),
        _ => default_store_name(),
    }
}
