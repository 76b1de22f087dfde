//! Analyzer configuration.

use indexmap::IndexMap;

/// Default npm registry URL.
pub const DEFAULT_REGISTRY: &str = "https://registry.npmjs.org";

/// Default request timeout in milliseconds.
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Options accepted by [`crate::Analyzer`].
#[derive(Debug, Clone)]
pub struct AnalyzerOptions {
    /// Base URL of an npm-compatible registry.
    pub registry: String,
    /// Request timeout in milliseconds. In-flight requests are aborted when
    /// the timeout elapses.
    pub timeout_ms: u64,
    /// Extra request headers, merged over the defaults; caller entries win.
    pub headers: IndexMap<String, String>,
}

impl Default for AnalyzerOptions {
    fn default() -> Self {
        Self {
            registry: DEFAULT_REGISTRY.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            headers: IndexMap::new(),
        }
    }
}

impl AnalyzerOptions {
    /// Options pointing at a non-default registry.
    #[must_use]
    pub fn with_registry(registry: impl Into<String>) -> Self {
        Self {
            registry: registry.into(),
            ..Self::default()
        }
    }
}
