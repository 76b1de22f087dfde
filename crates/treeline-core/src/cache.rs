//! Metadata cache with single-flight resolution.
//!
//! Keys retain the descriptor the caller asked for (`"express@^4"`), not the
//! version it resolved to, so repeated asks for the same range never touch
//! the registry twice.

use crate::error::AnalyzeError;
use crate::resolve::PackageInfo;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{OnceCell, RwLock};

type CacheCell = Arc<OnceCell<Arc<PackageInfo>>>;

/// Memoization of resolved package metadata by `"{name}@{descriptor}"`.
///
/// Concurrent lookups of one key share a single in-flight resolution; a
/// failed resolution is not cached and the next caller retries. There is no
/// eviction; the cache lives as long as its analyzer.
#[derive(Debug, Default)]
pub struct MetadataCache {
    entries: RwLock<HashMap<String, CacheCell>>,
}

impl MetadataCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The cache key for a `(name, descriptor)` pair.
    #[must_use]
    pub fn cache_key(name: &str, descriptor: &str) -> String {
        format!("{name}@{descriptor}")
    }

    /// Look up `(name, descriptor)`, running `resolve` at most once per key
    /// across concurrent callers.
    pub async fn get_or_resolve<F, Fut>(
        &self,
        name: &str,
        descriptor: &str,
        resolve: F,
    ) -> Result<Arc<PackageInfo>, AnalyzeError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<PackageInfo, AnalyzeError>>,
    {
        let key = Self::cache_key(name, descriptor);

        let cell = {
            let entries = self.entries.read().await;
            entries.get(&key).cloned()
        };

        let cell = match cell {
            Some(cell) => cell,
            None => {
                let mut entries = self.entries.write().await;
                entries
                    .entry(key)
                    .or_insert_with(|| Arc::new(OnceCell::new()))
                    .clone()
            }
        };

        cell.get_or_try_init(|| async { resolve().await.map(Arc::new) })
            .await
            .map(Arc::clone)
    }

    /// Whether a resolved entry exists for `(name, descriptor)`.
    pub async fn contains(&self, name: &str, descriptor: &str) -> bool {
        let entries = self.entries.read().await;
        entries
            .get(&Self::cache_key(name, descriptor))
            .is_some_and(|cell| cell.initialized())
    }

    /// Number of resolved entries.
    pub async fn len(&self) -> usize {
        let entries = self.entries.read().await;
        entries.values().filter(|cell| cell.initialized()).count()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
