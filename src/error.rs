use crate::transport::TransportError;
use thiserror::Error;

/// Structured error context for better error handling and debugging.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ErrorContext {
    /// URL of the request being handled when the error occurred
    pub url: Option<String>,
    /// Additional context about the error (e.g., expected status, actual value)
    pub details: Option<String>,
    /// Source of the error (e.g., "store_client", "network_client")
    pub source: Option<String>,
}

impl ErrorContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

/// Unified error type for the cache-first runtime.
///
/// Errors raised while matching or fetching reach the caller of
/// [`crate::strategy::CacheFirst::handle`] unchanged. Errors raised by the
/// detached store write never do.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Network transport error: {0}")]
    Network(#[from] TransportError),

    #[error("Network request timed out after {timeout_ms}ms{}", format_context(.context))]
    Timeout { timeout_ms: u64, context: ErrorContext },

    #[error("Store error: {message}{}", format_context(.context))]
    Store {
        message: String,
        context: ErrorContext,
    },

    #[error("Plugin '{plugin}' failed in {hook:?}: {message}")]
    Plugin {
        plugin: String,
        hook: crate::plugins::HookType,
        message: String,
    },

    #[error("Body error: {0}")]
    Body(String),

    #[error("Configuration error: {message}{}", format_context(.context))]
    Configuration {
        message: String,
        context: ErrorContext,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

// Helper function to format error context for display
fn format_context(ctx: &ErrorContext) -> String {
    let mut parts = Vec::new();
    if let Some(ref url) = ctx.url {
        parts.push(format!("url: {}", url));
    }
    if let Some(ref details) = ctx.details {
        parts.push(format!("details: {}", details));
    }
    if let Some(ref source) = ctx.source {
        parts.push(format!("source: {}", source));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" ({})", parts.join(", "))
    }
}

impl Error {
    /// Create a new store error with structured context
    pub fn store_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Store {
            message: msg.into(),
            context,
        }
    }

    /// Create a new configuration error with structured context
    pub fn configuration_with_context(msg: impl Into<String>, context: ErrorContext) -> Self {
        Error::Configuration {
            message: msg.into(),
            context,
        }
    }

    /// Error a plugin hook may return to abort the current operation.
    pub fn plugin(
        plugin: impl Into<String>,
        hook: crate::plugins::HookType,
        msg: impl Into<String>,
    ) -> Self {
        Error::Plugin {
            plugin: plugin.into(),
            hook,
            message: msg.into(),
        }
    }

    /// Connectivity failure that did not come from reqwest (e.g. a custom fetcher).
    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(TransportError::Other(msg.into()))
    }

    /// Extract error context if available
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            Error::Timeout { context, .. }
            | Error::Store { context, .. }
            | Error::Configuration { context, .. } => Some(context),
            _ => None,
        }
    }

    /// True for failures of the network path (transport, timeout).
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::Timeout { .. })
    }
}
